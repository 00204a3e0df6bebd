//! # dqm-core
//!
//! Shared building blocks for the trigger-efficiency monitor:
//! the error type, the reconstructed-object model (muons, missing
//! transverse energy, vertices), the per-event trigger records, and the
//! [`EventSource`] seam through which the monitor reads an event.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod run;
pub mod types;

pub use error::{Error, Result};
pub use event::{
    Event, EventId, EventSource, InputTag, L1Results, ReadinessStatus, TriggerResults,
};
pub use run::RunContext;
pub use types::{Met, Muon, Point3, Track, Vertex};
