//! Per-event data as seen by the monitor.
//!
//! The monitor never reads a concrete event type directly; it goes through
//! [`EventSource`], which resolves collections by [`InputTag`]. [`Event`]
//! is the in-memory implementation used by the command line front end and
//! by tests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Met, Muon, Vertex};

/// Label identifying a product inside an event (e.g. `"muons"`,
/// `"TriggerResults::HLT"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputTag(String);

impl InputTag {
    /// Create a tag.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Tag label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InputTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Event coordinates: run, lumisection block and event number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventId {
    /// Run number.
    pub run: u32,
    /// Lumisection block.
    pub lumi: u32,
    /// Event number.
    pub event: u64,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.run, self.lumi, self.event)
    }
}

/// Detector readiness (high-voltage / DCS) flags per partition id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadinessStatus(BTreeMap<u32, bool>);

impl ReadinessStatus {
    /// Build from `(partition, ready)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, bool)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Readiness of `partition`, `None` when the partition is not reported.
    pub fn is_ready(&self, partition: u32) -> Option<bool> {
        self.0.get(&partition).copied()
    }
}

/// High-level trigger decisions, keyed by path name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerResults(BTreeMap<String, bool>);

impl TriggerResults {
    /// Build from `(path, accepted)` pairs.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, bool)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Decision for `path`, `None` when the path was not run for this event.
    pub fn accepted(&self, path: &str) -> Option<bool> {
        self.0.get(path).copied()
    }
}

/// First-level trigger algorithm decisions before and after prescale masking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1Results {
    /// Decisions before masks are applied.
    #[serde(default)]
    pub before_mask: BTreeMap<String, bool>,
    /// Decisions after masks are applied.
    #[serde(default)]
    pub after_mask: BTreeMap<String, bool>,
}

impl L1Results {
    /// Decision for `algorithm`.
    pub fn decision(&self, algorithm: &str, before_mask: bool) -> Option<bool> {
        let table = if before_mask { &self.before_mask } else { &self.after_mask };
        table.get(algorithm).copied()
    }
}

/// Read access to the products of one event.
///
/// Every accessor returns `None` when the product is absent; the monitor
/// treats absence as a run-time condition, never as an error.
pub trait EventSource {
    /// Event coordinates.
    fn id(&self) -> EventId;

    /// MET collection stored under `tag`.
    fn met(&self, tag: &InputTag) -> Option<&[Met]>;

    /// Muon collection stored under `tag`.
    fn muons(&self, tag: &InputTag) -> Option<&[Muon]>;

    /// Vertex collection stored under `tag`.
    fn vertices(&self, tag: &InputTag) -> Option<&[Vertex]>;

    /// Readiness flags stored under `tag`.
    fn readiness(&self, tag: &InputTag) -> Option<&ReadinessStatus>;

    /// High-level trigger results stored under `tag`.
    fn trigger_results(&self, tag: &InputTag) -> Option<&TriggerResults>;

    /// First-level trigger decisions.
    fn l1_results(&self) -> Option<&L1Results>;
}

/// In-memory event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event coordinates.
    #[serde(flatten)]
    pub id: EventId,
    /// MET collections by tag.
    #[serde(default)]
    pub met: BTreeMap<InputTag, Vec<Met>>,
    /// Muon collections by tag.
    #[serde(default)]
    pub muons: BTreeMap<InputTag, Vec<Muon>>,
    /// Vertex collections by tag.
    #[serde(default)]
    pub vertices: BTreeMap<InputTag, Vec<Vertex>>,
    /// Readiness flags by tag.
    #[serde(default)]
    pub readiness: BTreeMap<InputTag, ReadinessStatus>,
    /// High-level trigger results by tag.
    #[serde(default)]
    pub trigger_results: BTreeMap<InputTag, TriggerResults>,
    /// First-level trigger decisions.
    #[serde(default)]
    pub l1: Option<L1Results>,
}

impl Event {
    /// Empty event with the given coordinates.
    pub fn new(run: u32, lumi: u32, event: u64) -> Self {
        Self { id: EventId { run, lumi, event }, ..Default::default() }
    }

    /// Store a MET collection.
    pub fn with_met(mut self, tag: impl Into<InputTag>, met: Vec<Met>) -> Self {
        self.met.insert(tag.into(), met);
        self
    }

    /// Store a muon collection.
    pub fn with_muons(mut self, tag: impl Into<InputTag>, muons: Vec<Muon>) -> Self {
        self.muons.insert(tag.into(), muons);
        self
    }

    /// Store a vertex collection.
    pub fn with_vertices(mut self, tag: impl Into<InputTag>, vertices: Vec<Vertex>) -> Self {
        self.vertices.insert(tag.into(), vertices);
        self
    }

    /// Store readiness flags.
    pub fn with_readiness(mut self, tag: impl Into<InputTag>, status: ReadinessStatus) -> Self {
        self.readiness.insert(tag.into(), status);
        self
    }

    /// Store high-level trigger results.
    pub fn with_trigger_results(
        mut self,
        tag: impl Into<InputTag>,
        results: TriggerResults,
    ) -> Self {
        self.trigger_results.insert(tag.into(), results);
        self
    }

    /// Store first-level trigger decisions.
    pub fn with_l1(mut self, l1: L1Results) -> Self {
        self.l1 = Some(l1);
        self
    }
}

impl EventSource for Event {
    fn id(&self) -> EventId {
        self.id
    }

    fn met(&self, tag: &InputTag) -> Option<&[Met]> {
        self.met.get(tag).map(Vec::as_slice)
    }

    fn muons(&self, tag: &InputTag) -> Option<&[Muon]> {
        self.muons.get(tag).map(Vec::as_slice)
    }

    fn vertices(&self, tag: &InputTag) -> Option<&[Vertex]> {
        self.vertices.get(tag).map(Vec::as_slice)
    }

    fn readiness(&self, tag: &InputTag) -> Option<&ReadinessStatus> {
        self.readiness.get(tag)
    }

    fn trigger_results(&self, tag: &InputTag) -> Option<&TriggerResults> {
        self.trigger_results.get(tag)
    }

    fn l1_results(&self) -> Option<&L1Results> {
        self.l1.as_ref()
    }
}
