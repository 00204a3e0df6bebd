//! Gate construction, per-run arming and per-event acceptance.

use dqm_core::{EventSource, InputTag, Result, RunContext};

use crate::config::{CombineMode, ErrorPolicy, GateConfig};
use crate::pattern::PathPattern;

/// A configured gate, not yet bound to a run.
#[derive(Debug, Clone)]
pub struct TriggerGate {
    label: String,
    config: GateConfig,
    hlt: Vec<PathPattern>,
    l1: Vec<PathPattern>,
}

impl TriggerGate {
    /// Validate `config` and build a gate. `label` names the gate in logs.
    pub fn new(label: impl Into<String>, config: GateConfig) -> Result<Self> {
        let label = label.into();
        let hlt = config
            .high_level
            .paths
            .iter()
            .map(|p| PathPattern::parse(p))
            .collect::<Result<Vec<_>>>()?;
        let l1 = config
            .first_level
            .algorithms
            .iter()
            .map(|p| PathPattern::parse(p))
            .collect::<Result<Vec<_>>>()?;
        if config.enabled && !config.has_tiers() {
            log::info!("{label} gate: enabled but no tier is configured, accepting all events");
        }
        Ok(Self { label, config, hlt, l1 })
    }

    /// True if the gate can reject events.
    pub fn is_on(&self) -> bool {
        self.config.enabled && self.config.has_tiers()
    }

    /// Gate label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Configuration the gate was built from.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Resolve configured paths against the run's menus.
    ///
    /// Entries that match nothing are kept as unresolved; whether they fail
    /// their tier is decided per event by the tier's error policy.
    pub fn init_run(&self, ctx: &RunContext) -> ArmedGate {
        let cfg = &self.config;
        let mut unresolved = Vec::new();

        let readiness = (!cfg.readiness.partitions.is_empty()).then(|| ArmedReadiness {
            tag: cfg.readiness.input_tag.clone(),
            partitions: cfg.readiness.partitions.clone(),
            mode: cfg.readiness.mode,
            policy: cfg.readiness.error_policy,
        });

        let high_level = (!self.hlt.is_empty()).then(|| {
            let menu = ctx.hlt_menu(&cfg.high_level.input_tag).unwrap_or_default();
            if menu.is_empty() && self.config.verbosity > 0 {
                log::warn!(
                    "{} gate: no HLT menu for '{}' in run {}",
                    self.label,
                    cfg.high_level.input_tag,
                    ctx.run
                );
            }
            ArmedTier {
                mode: cfg.high_level.mode,
                policy: cfg.high_level.error_policy,
                entries: self.resolve(&self.hlt, menu, "HLT path", ctx.run, &mut unresolved),
            }
        });

        let first_level = (!self.l1.is_empty()).then(|| ArmedTier {
            mode: cfg.first_level.mode,
            policy: cfg.first_level.error_policy,
            entries: self.resolve(&self.l1, &ctx.l1_menu, "L1 algorithm", ctx.run, &mut unresolved),
        });

        ArmedGate {
            label: self.label.clone(),
            on: self.is_on(),
            run: ctx.run,
            mode: cfg.mode,
            verbosity: cfg.verbosity,
            hlt_tag: cfg.high_level.input_tag.clone(),
            l1_before_mask: cfg.first_level.before_mask,
            readiness,
            high_level,
            first_level,
            unresolved,
        }
    }

    fn resolve(
        &self,
        patterns: &[PathPattern],
        menu: &[String],
        what: &str,
        run: u32,
        unresolved: &mut Vec<String>,
    ) -> Vec<Entry> {
        patterns
            .iter()
            .map(|p| {
                let names: Vec<String> = p.expand(menu).into_iter().map(str::to_string).collect();
                if names.is_empty() {
                    if self.config.verbosity > 0 {
                        log::warn!(
                            "{} gate: {what} '{}' does not exist in run {run}",
                            self.label,
                            p.as_str()
                        );
                    }
                    unresolved.push(p.as_str().to_string());
                    Entry::Unresolved
                } else {
                    if p.is_wildcard() {
                        log::debug!(
                            "{} gate: {what} '{}' matches {} entries in run {run}",
                            self.label,
                            p.as_str(),
                            names.len()
                        );
                    }
                    Entry::Resolved { names, negated: p.is_negated() }
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Resolved { names: Vec<String>, negated: bool },
    Unresolved,
}

#[derive(Debug, Clone)]
struct ArmedReadiness {
    tag: InputTag,
    partitions: Vec<u32>,
    mode: CombineMode,
    policy: ErrorPolicy,
}

#[derive(Debug, Clone)]
struct ArmedTier {
    mode: CombineMode,
    policy: ErrorPolicy,
    entries: Vec<Entry>,
}

/// Outcome of an entry that could not be evaluated, per policy.
fn on_error(policy: ErrorPolicy) -> Option<bool> {
    match policy {
        ErrorPolicy::Strict => Some(false),
        ErrorPolicy::Lenient => None,
    }
}

impl ArmedTier {
    /// `decision(name)` is `None` when the event carries no decision for
    /// `name`, which counts as "did not fire".
    fn evaluate(&self, decision: impl Fn(&str) -> Option<bool>) -> Option<bool> {
        let mut results = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry {
                Entry::Unresolved => match self.policy {
                    ErrorPolicy::Strict => return Some(false),
                    ErrorPolicy::Lenient => results.push(None),
                },
                Entry::Resolved { names, negated } => {
                    let fired = names.iter().any(|n| decision(n).unwrap_or(false));
                    results.push(Some(fired != *negated));
                }
            }
        }
        self.mode.combine(results)
    }
}

/// A gate bound to one run.
#[derive(Debug, Clone)]
pub struct ArmedGate {
    label: String,
    on: bool,
    run: u32,
    mode: CombineMode,
    verbosity: u32,
    hlt_tag: InputTag,
    l1_before_mask: bool,
    readiness: Option<ArmedReadiness>,
    high_level: Option<ArmedTier>,
    first_level: Option<ArmedTier>,
    unresolved: Vec<String>,
}

impl ArmedGate {
    /// True if the gate can reject events.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Run the gate was armed for.
    pub fn run(&self) -> u32 {
        self.run
    }

    /// Configured entries that matched nothing in this run's menus.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Evaluate the gate for one event.
    pub fn accept<E: EventSource + ?Sized>(&self, event: &E) -> bool {
        if !self.on {
            return true;
        }
        let tiers = [
            self.readiness.as_ref().and_then(|r| self.accept_readiness(r, event)),
            self.first_level.as_ref().and_then(|t| self.accept_l1(t, event)),
            self.high_level.as_ref().and_then(|t| self.accept_hlt(t, event)),
        ];
        let accepted = self.mode.combine(tiers).unwrap_or(true);
        if !accepted && self.verbosity > 1 {
            log::debug!("{} gate: rejected event {}", self.label, event.id());
        }
        accepted
    }

    fn accept_readiness<E: EventSource + ?Sized>(
        &self,
        r: &ArmedReadiness,
        event: &E,
    ) -> Option<bool> {
        let Some(status) = event.readiness(&r.tag) else {
            self.missing("readiness flags", r.tag.as_str(), event);
            return on_error(r.policy);
        };
        let mut results = Vec::with_capacity(r.partitions.len());
        for &p in &r.partitions {
            match status.is_ready(p) {
                Some(ready) => results.push(Some(ready)),
                None if r.policy == ErrorPolicy::Strict => return Some(false),
                None => results.push(None),
            }
        }
        r.mode.combine(results)
    }

    fn accept_hlt<E: EventSource + ?Sized>(&self, tier: &ArmedTier, event: &E) -> Option<bool> {
        let Some(results) = event.trigger_results(&self.hlt_tag) else {
            self.missing("trigger results", self.hlt_tag.as_str(), event);
            return on_error(tier.policy);
        };
        tier.evaluate(|name| results.accepted(name))
    }

    fn accept_l1<E: EventSource + ?Sized>(&self, tier: &ArmedTier, event: &E) -> Option<bool> {
        let Some(l1) = event.l1_results() else {
            self.missing("L1 decisions", "l1", event);
            return on_error(tier.policy);
        };
        tier.evaluate(|name| l1.decision(name, self.l1_before_mask))
    }

    fn missing<E: EventSource + ?Sized>(&self, what: &str, tag: &str, event: &E) {
        if self.verbosity > 0 {
            log::debug!("{} gate: no {what} '{tag}' in event {}", self.label, event.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FirstLevelTier, HighLevelTier, ReadinessTier};
    use dqm_core::{Event, L1Results, ReadinessStatus, TriggerResults};

    const HLT: &str = "TriggerResults::HLT";

    fn hlt_config(paths: &[&str], mode: CombineMode, policy: ErrorPolicy) -> GateConfig {
        GateConfig {
            high_level: HighLevelTier {
                paths: paths.iter().map(|s| s.to_string()).collect(),
                mode,
                error_policy: policy,
                ..HighLevelTier::default()
            },
            ..GateConfig::default()
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(1)
            .with_hlt_menu(HLT, ["HLT_IsoMu24_v4", "HLT_Mu50_v3", "HLT_PFMET120_v7"])
            .with_l1_menu(["L1_SingleMu22", "L1_ETM120"])
    }

    fn event_with(fired: &[(&str, bool)]) -> Event {
        Event::new(1, 1, 1).with_trigger_results(HLT, TriggerResults::from_pairs(fired.to_vec()))
    }

    #[test]
    fn disabled_gate_ignores_configured_tiers() {
        let mut cfg = hlt_config(&["HLT_IsoMu24_v*"], CombineMode::Or, ErrorPolicy::Strict);
        cfg.first_level.algorithms = vec!["L1_SingleMu22".into()];
        cfg.readiness.partitions = vec![24];
        cfg.enabled = false;
        let gate = TriggerGate::new("den", cfg).unwrap();
        assert!(gate.config().has_tiers());
        assert!(!gate.is_on());

        let armed = gate.init_run(&ctx());
        assert!(!armed.is_on());
        assert!(armed.accept(&event_with(&[("HLT_IsoMu24_v4", false)])));
        assert!(armed.accept(&Event::new(1, 1, 1)));

        let mut enabled = gate.config().clone();
        enabled.enabled = true;
        let armed = TriggerGate::new("den", enabled).unwrap().init_run(&ctx());
        assert!(!armed.accept(&event_with(&[("HLT_IsoMu24_v4", false)])));
    }

    #[test]
    fn no_tiers_means_off() {
        let gate = TriggerGate::new("den", GateConfig::default()).unwrap();
        assert!(!gate.is_on());
        assert!(gate.init_run(&ctx()).accept(&Event::new(1, 1, 1)));
    }

    #[test]
    fn hlt_or_of_paths() {
        let cfg = hlt_config(&["HLT_IsoMu24_v*", "HLT_Mu50_v*"], CombineMode::Or, ErrorPolicy::Strict);
        let gate = TriggerGate::new("num", cfg).unwrap().init_run(&ctx());
        assert!(gate.unresolved().is_empty());
        assert!(gate.accept(&event_with(&[("HLT_IsoMu24_v4", false), ("HLT_Mu50_v3", true)])));
        assert!(!gate.accept(&event_with(&[("HLT_IsoMu24_v4", false), ("HLT_Mu50_v3", false)])));
        // Paths absent from the event's results did not fire.
        assert!(!gate.accept(&event_with(&[])));
    }

    #[test]
    fn hlt_and_with_negation() {
        let cfg = hlt_config(&["HLT_IsoMu24_v*", "~HLT_Mu50_v*"], CombineMode::And, ErrorPolicy::Strict);
        let gate = TriggerGate::new("num", cfg).unwrap().init_run(&ctx());
        assert!(gate.accept(&event_with(&[("HLT_IsoMu24_v4", true), ("HLT_Mu50_v3", false)])));
        assert!(!gate.accept(&event_with(&[("HLT_IsoMu24_v4", true), ("HLT_Mu50_v3", true)])));
    }

    #[test]
    fn unresolved_path_strict_fails_tier() {
        let cfg = hlt_config(&["HLT_IsoMu24_v*", "HLT_Ele32_v*"], CombineMode::Or, ErrorPolicy::Strict);
        let gate = TriggerGate::new("num", cfg).unwrap().init_run(&ctx());
        assert_eq!(gate.unresolved(), ["HLT_Ele32_v*"]);
        assert!(!gate.accept(&event_with(&[("HLT_IsoMu24_v4", true)])));
    }

    #[test]
    fn unresolved_path_lenient_is_skipped() {
        let cfg = hlt_config(&["HLT_IsoMu24_v*", "HLT_Ele32_v*"], CombineMode::And, ErrorPolicy::Lenient);
        let gate = TriggerGate::new("num", cfg).unwrap().init_run(&ctx());
        assert!(gate.accept(&event_with(&[("HLT_IsoMu24_v4", true)])));
        assert!(!gate.accept(&event_with(&[("HLT_IsoMu24_v4", false)])));
    }

    #[test]
    fn all_unresolved_lenient_tier_does_not_constrain() {
        let cfg = hlt_config(&["HLT_Ele32_v*"], CombineMode::Or, ErrorPolicy::Lenient);
        let gate = TriggerGate::new("num", cfg).unwrap().init_run(&RunContext::new(2));
        assert!(gate.accept(&Event::new(2, 1, 1)));
    }

    #[test]
    fn missing_results_follow_policy() {
        let strict = hlt_config(&["HLT_Mu50_v*"], CombineMode::Or, ErrorPolicy::Strict);
        let lenient = hlt_config(&["HLT_Mu50_v*"], CombineMode::Or, ErrorPolicy::Lenient);
        let ev = Event::new(1, 1, 1);
        assert!(!TriggerGate::new("a", strict).unwrap().init_run(&ctx()).accept(&ev));
        assert!(TriggerGate::new("b", lenient).unwrap().init_run(&ctx()).accept(&ev));
    }

    #[test]
    fn readiness_partitions() {
        let cfg = GateConfig {
            readiness: ReadinessTier { partitions: vec![24, 25], ..ReadinessTier::default() },
            ..GateConfig::default()
        };
        let gate = TriggerGate::new("den", cfg).unwrap().init_run(&ctx());
        let ready = Event::new(1, 1, 1)
            .with_readiness("scalersRawToDigi", ReadinessStatus::from_pairs([(24, true), (25, true)]));
        let not_ready = Event::new(1, 1, 2)
            .with_readiness("scalersRawToDigi", ReadinessStatus::from_pairs([(24, true), (25, false)]));
        assert!(gate.accept(&ready));
        assert!(!gate.accept(&not_ready));
        // Lenient by default: no flags at all does not reject.
        assert!(gate.accept(&Event::new(1, 1, 3)));
    }

    #[test]
    fn l1_mask_choice() {
        let l1 = L1Results {
            before_mask: [("L1_SingleMu22".to_string(), true)].into_iter().collect(),
            after_mask: [("L1_SingleMu22".to_string(), false)].into_iter().collect(),
        };
        let ev = Event::new(1, 1, 1).with_l1(l1);
        let mk = |before_mask| GateConfig {
            first_level: FirstLevelTier {
                algorithms: vec!["L1_SingleMu22".into()],
                before_mask,
                ..FirstLevelTier::default()
            },
            ..GateConfig::default()
        };
        assert!(TriggerGate::new("a", mk(true)).unwrap().init_run(&ctx()).accept(&ev));
        assert!(!TriggerGate::new("b", mk(false)).unwrap().init_run(&ctx()).accept(&ev));
    }

    #[test]
    fn tiers_combined_with_or() {
        let mut cfg = hlt_config(&["HLT_PFMET120_v*"], CombineMode::Or, ErrorPolicy::Strict);
        cfg.mode = CombineMode::Or;
        cfg.first_level.algorithms = vec!["L1_SingleMu22".into()];
        let gate = TriggerGate::new("den", cfg).unwrap().init_run(&ctx());
        let l1_only = event_with(&[("HLT_PFMET120_v7", false)]).with_l1(L1Results {
            after_mask: [("L1_SingleMu22".to_string(), true)].into_iter().collect(),
            ..L1Results::default()
        });
        assert!(gate.accept(&l1_only));
        assert!(!gate.accept(&event_with(&[("HLT_PFMET120_v7", false)])));
    }

    #[test]
    fn bad_pattern_is_config_error() {
        let cfg = hlt_config(&[""], CombineMode::Or, ErrorPolicy::Strict);
        assert!(TriggerGate::new("num", cfg).is_err());
    }
}
