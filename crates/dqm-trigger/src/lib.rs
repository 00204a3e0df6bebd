//! # dqm-trigger
//!
//! Trigger gates combine three tiers of per-event flags (detector
//! readiness partitions, first-level algorithms, high-level paths) into a
//! single accept/reject decision.
//!
//! A [`TriggerGate`] is built once from configuration. At the start of
//! each run it is armed against that run's trigger menus
//! ([`TriggerGate::init_run`]), producing an [`ArmedGate`]; only an armed
//! gate can accept events.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod gate;
pub mod pattern;

pub use config::{
    CombineMode, ErrorPolicy, FirstLevelTier, GateConfig, HighLevelTier, ReadinessTier,
};
pub use gate::{ArmedGate, TriggerGate};
pub use pattern::PathPattern;
