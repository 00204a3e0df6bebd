//! Booking and the per-event gate/selection/fill pipeline.

use dqm_core::{EventSource, Met, Muon, Point3, Result, RunContext, Vertex};
use dqm_expr::Selector;
use dqm_hist::{BinningSpec, FillPoint, HistogramRegistry, Labels, PairId, Side};
use dqm_trigger::{ArmedGate, TriggerGate};

use crate::config::MonitorConfig;
use crate::outcome::{EventOutcome, RunSummary};

/// Base names of the booked pairs, in booking order.
pub const HIST_NAMES: [&str; 9] = [
    "muon_pt",
    "muon_pt_variable",
    "muonVsLS",
    "muon_phi",
    "muon_eta",
    "muon_eta_variablebinning",
    "muon_dxy",
    "muon_dz",
    "muon_etaphi",
];

/// First non-fake vertex position, or the origin when there is none.
pub fn reference_point(vertices: &[Vertex]) -> Point3 {
    vertices.iter().find(|v| !v.is_fake).map_or(Point3::ORIGIN, Vertex::position)
}

#[derive(Debug, Clone)]
struct Axes {
    pt: BinningSpec,
    pt_variable: BinningSpec,
    eta: BinningSpec,
    eta_variable: BinningSpec,
    phi: BinningSpec,
    dxy: BinningSpec,
    dz: BinningSpec,
    ls: BinningSpec,
    pt_range: (f64, f64),
}

#[derive(Debug, Clone, Copy)]
struct MuonPairs {
    pt: PairId,
    pt_variable: PairId,
    vs_ls: PairId,
    phi: PairId,
    eta: PairId,
    eta_variable: PairId,
    dxy: PairId,
    dz: PairId,
    eta_phi: PairId,
}

/// What gets filled for the leading candidate.
#[derive(Debug, Clone, Copy)]
struct Measurement {
    pt: f64,
    eta: f64,
    phi: f64,
    ls: f64,
    dxy: Option<f64>,
    dz: Option<f64>,
}

impl Measurement {
    fn new(muon: &Muon, ls: u32, pv: &Point3) -> Self {
        let track = muon.best_track.as_ref();
        Self {
            pt: muon.pt,
            eta: muon.eta,
            phi: muon.phi,
            ls: f64::from(ls),
            dxy: track.map(|t| t.dxy(pv)),
            dz: track.map(|t| t.dz(pv)),
        }
    }
}

/// The configured monitor. Immutable once built; runs are driven through
/// [`MuonMonitor::start_run`] and [`MuonMonitor::process_event`].
#[derive(Debug)]
pub struct MuonMonitor {
    config: MonitorConfig,
    axes: Axes,
    met_selection: Selector<Met>,
    muon_selection: Selector<Muon>,
    numerator_gate: TriggerGate,
    denominator_gate: TriggerGate,
}

/// State of one run: its histograms, its armed gates and its counters.
#[derive(Debug)]
pub struct MonitorRun {
    run: u32,
    registry: HistogramRegistry,
    pairs: MuonPairs,
    numerator_gate: ArmedGate,
    denominator_gate: ArmedGate,
    summary: RunSummary,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    /// Run number.
    pub run: u32,
    /// Filled histograms.
    pub registry: HistogramRegistry,
    /// Outcome counts.
    pub summary: RunSummary,
}

impl MuonMonitor {
    /// Validate the configuration: binnings, selections and gates.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let h = &config.histogram_config;
        let pt = h.muon_pset.binning()?;
        let axes = Axes {
            pt_range: (pt.low(), pt.high()),
            pt,
            pt_variable: BinningSpec::variable(h.muon_binning.clone())?,
            eta: h.eta_pset.binning()?,
            eta_variable: BinningSpec::variable(h.muon_eta_binning.clone())?,
            phi: h.phi_pset.binning()?,
            dxy: h.dxy_pset.binning()?,
            dz: h.dz_pset.binning()?,
            ls: h.ls_pset.binning()?,
        };
        BinningSpec::grid_cells(&axes.eta, &axes.phi)?;
        let met_selection = Selector::compile(&config.event_selection)?;
        let muon_selection = Selector::compile(&config.candidate_selection)?;
        let numerator_gate = TriggerGate::new("numerator", config.numerator_gate.clone())?;
        let denominator_gate = TriggerGate::new("denominator", config.denominator_gate.clone())?;
        Ok(Self { config, axes, met_selection, muon_selection, numerator_gate, denominator_gate })
    }

    /// Configuration the monitor was built from.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Gate applied before the denominator fill.
    pub fn denominator_gate(&self) -> &TriggerGate {
        &self.denominator_gate
    }

    /// Gate applied before the numerator fill.
    pub fn numerator_gate(&self) -> &TriggerGate {
        &self.numerator_gate
    }

    /// Book a fresh registry and arm both gates for the run.
    pub fn start_run(&self, ctx: &RunContext) -> Result<MonitorRun> {
        let mut registry = HistogramRegistry::new(&self.config.folder_name);
        let pairs = self.book(&mut registry)?;
        let numerator_gate = self.numerator_gate.init_run(ctx);
        let denominator_gate = self.denominator_gate.init_run(ctx);
        log::info!(
            "run {}: booked {} histograms under '{}' (denominator gate {}, numerator gate {})",
            ctx.run,
            registry.len(),
            registry.folder(),
            if denominator_gate.is_on() { "on" } else { "off" },
            if numerator_gate.is_on() { "on" } else { "off" },
        );
        Ok(MonitorRun {
            run: ctx.run,
            registry,
            pairs,
            numerator_gate,
            denominator_gate,
            summary: RunSummary::default(),
        })
    }

    fn book(&self, reg: &mut HistogramRegistry) -> Result<MuonPairs> {
        let a = &self.axes;
        let pt_title = "Muon pT [GeV]";
        let (pt_low, pt_high) = a.pt_range;
        Ok(MuonPairs {
            pt: reg.book_1d(
                &Labels::new("muon_pt", "muon PT").axes(pt_title, "events / [GeV]"),
                &a.pt,
            )?,
            pt_variable: reg.book_1d(
                &Labels::new("muon_pt_variable", "muon PT").axes(pt_title, "events / [GeV]"),
                &a.pt_variable,
            )?,
            vs_ls: reg.book_profile(
                &Labels::new("muonVsLS", "muon pt vs LS").axes("LS", pt_title),
                &a.ls,
                pt_low,
                pt_high,
            )?,
            phi: reg.book_1d(
                &Labels::new("muon_phi", "Muon phi").axes("Muon #phi", "events / 0.1 rad"),
                &a.phi,
            )?,
            eta: reg.book_1d(
                &Labels::new("muon_eta", "Muon eta").axes("Muon #eta", "events"),
                &a.eta,
            )?,
            eta_variable: reg.book_1d(
                &Labels::new("muon_eta_variablebinning", "Muon eta").axes("Muon #eta", "events"),
                &a.eta_variable,
            )?,
            dxy: reg.book_1d(
                &Labels::new("muon_dxy", "Muon dxy").axes("Muon #dxy", "events"),
                &a.dxy,
            )?,
            dz: reg.book_1d(&Labels::new("muon_dz", "Muon dz").axes("Muon #dz", "events"), &a.dz)?,
            eta_phi: reg.book_2d(
                &Labels::new("muon_etaphi", "Muon eta-phi").axes("#eta", "#phi"),
                &a.eta,
                &a.phi,
            )?,
        })
    }

    /// Run one event through the pipeline.
    ///
    /// Every rejection is an [`EventOutcome`]; an `Err` only signals a
    /// registry that does not hold the run's handles.
    pub fn process_event<E: EventSource + ?Sized>(
        &self,
        run: &mut MonitorRun,
        event: &E,
    ) -> Result<EventOutcome> {
        let outcome = self.evaluate(run, event)?;
        if !outcome.filled_denominator() {
            log::debug!("event {}: {outcome}", event.id());
        }
        run.summary.record(outcome);
        Ok(outcome)
    }

    fn evaluate<E: EventSource + ?Sized>(
        &self,
        run: &mut MonitorRun,
        event: &E,
    ) -> Result<EventOutcome> {
        let tags = &self.config.input_tags;

        if !run.denominator_gate.accept(event) {
            return Ok(EventOutcome::FailedDenominatorGate);
        }

        let Some(met) = event.met(&tags.met) else {
            return Ok(EventOutcome::MissingCollection("met"));
        };
        match met.first() {
            Some(leading) if self.met_selection.accept(leading) => {}
            _ => return Ok(EventOutcome::FailedEventSelection),
        }

        let pv = reference_point(event.vertices(&tags.vertices).unwrap_or_default());

        let Some(muons) = event.muons(&tags.muons) else {
            return Ok(EventOutcome::MissingCollection("muons"));
        };
        let required = self.config.minimum_candidate_count as usize;
        if muons.len() < required {
            return Ok(EventOutcome::TooFewCandidates { found: muons.len(), required });
        }
        let candidates = self.muon_selection.filter(muons);
        if candidates.len() < required {
            return Ok(EventOutcome::TooFewCandidates { found: candidates.len(), required });
        }
        let Some(leading) = candidates.first() else {
            return Ok(EventOutcome::NoCandidate);
        };

        let m = Measurement::new(leading, event.id().lumi, &pv);
        fill(&mut run.registry, &run.pairs, Side::Denominator, &m)?;

        if !run.numerator_gate.accept(event) {
            return Ok(EventOutcome::DenominatorOnly);
        }
        fill(&mut run.registry, &run.pairs, Side::Numerator, &m)?;
        Ok(EventOutcome::Accepted)
    }
}

fn fill(reg: &mut HistogramRegistry, p: &MuonPairs, side: Side, m: &Measurement) -> Result<()> {
    let mut put = |id: PairId, point: FillPoint| reg.fill(id, side, point);
    put(p.pt, FillPoint::X(m.pt))?;
    put(p.pt_variable, FillPoint::X(m.pt))?;
    put(p.phi, FillPoint::X(m.phi))?;
    put(p.eta, FillPoint::X(m.eta))?;
    put(p.eta_variable, FillPoint::X(m.eta))?;
    put(p.vs_ls, FillPoint::XY(m.ls, m.pt))?;
    put(p.eta_phi, FillPoint::XY(m.eta, m.phi))?;
    if let Some(dxy) = m.dxy {
        put(p.dxy, FillPoint::X(dxy))?;
    }
    if let Some(dz) = m.dz {
        put(p.dz, FillPoint::X(dz))?;
    }
    Ok(())
}

impl MonitorRun {
    /// Run number.
    pub fn run(&self) -> u32 {
        self.run
    }

    /// Histograms filled so far.
    pub fn registry(&self) -> &HistogramRegistry {
        &self.registry
    }

    /// Outcome counts so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Trigger entries of either gate that matched nothing in this run.
    pub fn unresolved_paths(&self) -> Vec<&str> {
        self.denominator_gate
            .unresolved()
            .iter()
            .chain(self.numerator_gate.unresolved())
            .map(String::as_str)
            .collect()
    }

    /// Close the run.
    pub fn finish(self) -> RunOutput {
        let s = &self.summary;
        log::info!(
            "run {}: {} events, {} denominator fills, {} numerator fills",
            self.run,
            s.processed,
            s.denominator_filled(),
            s.numerator_filled()
        );
        RunOutput { run: self.run, registry: self.registry, summary: self.summary }
    }
}
