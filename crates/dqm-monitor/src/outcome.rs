//! Per-event outcomes and per-run bookkeeping.

use std::fmt;

use serde::Serialize;

/// How far an event got through the pipeline.
///
/// Only [`EventOutcome::DenominatorOnly`] and [`EventOutcome::Accepted`]
/// touch histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Rejected by the denominator gate.
    FailedDenominatorGate,
    /// A required input collection was absent.
    MissingCollection(&'static str),
    /// No MET reading, or the leading reading failed the event selection.
    FailedEventSelection,
    /// Fewer muons than the configured minimum, before or after the cut.
    TooFewCandidates {
        /// Muons available at the failing check.
        found: usize,
        /// Configured minimum.
        required: usize,
    },
    /// The minimum was met but no candidate survived the cut.
    NoCandidate,
    /// Denominator filled; rejected by the numerator gate.
    DenominatorOnly,
    /// Denominator and numerator filled.
    Accepted,
}

impl EventOutcome {
    /// True if the denominator histograms were filled.
    pub fn filled_denominator(self) -> bool {
        matches!(self, EventOutcome::DenominatorOnly | EventOutcome::Accepted)
    }

    /// True if the numerator histograms were filled.
    pub fn filled_numerator(self) -> bool {
        self == EventOutcome::Accepted
    }
}

impl fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventOutcome::FailedDenominatorGate => f.write_str("failed denominator gate"),
            EventOutcome::MissingCollection(what) => write!(f, "missing {what} collection"),
            EventOutcome::FailedEventSelection => f.write_str("failed event selection"),
            EventOutcome::TooFewCandidates { found, required } => {
                write!(f, "too few candidates ({found} < {required})")
            }
            EventOutcome::NoCandidate => f.write_str("no candidate"),
            EventOutcome::DenominatorOnly => f.write_str("denominator only"),
            EventOutcome::Accepted => f.write_str("accepted"),
        }
    }
}

/// Outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Events seen.
    pub processed: u64,
    /// Rejected by the denominator gate.
    pub failed_denominator_gate: u64,
    /// Missing an input collection.
    pub missing_collection: u64,
    /// Rejected by the event selection.
    pub failed_event_selection: u64,
    /// Rejected by the candidate count.
    pub too_few_candidates: u64,
    /// No surviving candidate.
    pub no_candidate: u64,
    /// Filled the denominator only.
    pub denominator_only: u64,
    /// Filled both sides.
    pub accepted: u64,
}

impl RunSummary {
    /// Count one outcome.
    pub fn record(&mut self, outcome: EventOutcome) {
        self.processed += 1;
        let slot = match outcome {
            EventOutcome::FailedDenominatorGate => &mut self.failed_denominator_gate,
            EventOutcome::MissingCollection(_) => &mut self.missing_collection,
            EventOutcome::FailedEventSelection => &mut self.failed_event_selection,
            EventOutcome::TooFewCandidates { .. } => &mut self.too_few_candidates,
            EventOutcome::NoCandidate => &mut self.no_candidate,
            EventOutcome::DenominatorOnly => &mut self.denominator_only,
            EventOutcome::Accepted => &mut self.accepted,
        };
        *slot += 1;
    }

    /// Events that filled the denominator.
    pub fn denominator_filled(&self) -> u64 {
        self.denominator_only + self.accepted
    }

    /// Events that filled the numerator.
    pub fn numerator_filled(&self) -> u64 {
        self.accepted
    }
}
