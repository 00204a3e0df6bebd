//! Gate configuration.

use dqm_core::InputTag;
use serde::{Deserialize, Serialize};

/// How several boolean results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// All must pass.
    #[default]
    And,
    /// At least one must pass.
    Or,
}

impl CombineMode {
    /// Combine results, ignoring skipped (`None`) ones.
    ///
    /// Returns `None` when every input was skipped.
    pub fn combine(self, results: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
        let mut seen = false;
        let mut acc = matches!(self, CombineMode::And);
        for r in results.into_iter().flatten() {
            seen = true;
            acc = match self {
                CombineMode::And => acc && r,
                CombineMode::Or => acc || r,
            };
        }
        seen.then_some(acc)
    }
}

/// What a tier does when a configured entry cannot be evaluated (path
/// missing from the run's menu, record missing from the event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// The tier fails.
    Strict,
    /// The entry is skipped.
    Lenient,
}

/// Detector readiness tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ReadinessTier {
    /// Where readiness flags are read from.
    pub input_tag: InputTag,
    /// Partition ids that must be ready.
    pub partitions: Vec<u32>,
    /// Combination of partition flags.
    pub mode: CombineMode,
    /// Behavior when flags are unavailable.
    pub error_policy: ErrorPolicy,
}

impl Default for ReadinessTier {
    fn default() -> Self {
        Self {
            input_tag: InputTag::new("scalersRawToDigi"),
            partitions: Vec::new(),
            mode: CombineMode::And,
            error_policy: ErrorPolicy::Lenient,
        }
    }
}

/// High-level trigger tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct HighLevelTier {
    /// Where trigger results are read from (also selects the run menu).
    pub input_tag: InputTag,
    /// Path names or patterns (`*`, `?` wildcards, leading `~` negates).
    pub paths: Vec<String>,
    /// Combination of path results.
    pub mode: CombineMode,
    /// Behavior for unresolved paths or missing results.
    pub error_policy: ErrorPolicy,
}

impl Default for HighLevelTier {
    fn default() -> Self {
        Self {
            input_tag: InputTag::new("TriggerResults::HLT"),
            paths: Vec::new(),
            mode: CombineMode::Or,
            error_policy: ErrorPolicy::Strict,
        }
    }
}

/// First-level trigger tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FirstLevelTier {
    /// Algorithm names or patterns.
    pub algorithms: Vec<String>,
    /// Combination of algorithm decisions.
    pub mode: CombineMode,
    /// Behavior for unresolved algorithms or missing decisions.
    pub error_policy: ErrorPolicy,
    /// Use decisions before prescale masks.
    pub before_mask: bool,
}

impl Default for FirstLevelTier {
    fn default() -> Self {
        Self {
            algorithms: Vec::new(),
            mode: CombineMode::And,
            error_policy: ErrorPolicy::Strict,
            before_mask: false,
        }
    }
}

/// Complete configuration of one gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GateConfig {
    /// Master switch; a disabled gate accepts everything.
    pub enabled: bool,
    /// Combination of the tier results.
    pub mode: CombineMode,
    /// Detector readiness tier.
    pub readiness: ReadinessTier,
    /// High-level trigger tier.
    pub high_level: HighLevelTier,
    /// First-level trigger tier.
    pub first_level: FirstLevelTier,
    /// 0 = quiet, 1 = warn about unresolved paths, 2+ = also log rejections.
    pub verbosity: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CombineMode::And,
            readiness: ReadinessTier::default(),
            high_level: HighLevelTier::default(),
            first_level: FirstLevelTier::default(),
            verbosity: 1,
        }
    }
}

impl GateConfig {
    /// True if at least one tier lists something to check.
    pub fn has_tiers(&self) -> bool {
        !self.readiness.partitions.is_empty()
            || !self.high_level.paths.is_empty()
            || !self.first_level.algorithms.is_empty()
    }
}
