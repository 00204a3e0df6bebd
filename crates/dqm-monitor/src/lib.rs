//! # dqm-monitor
//!
//! The muon trigger-efficiency monitor. For every event it applies a
//! reference (denominator) gate, selects the event-level MET reading and
//! the muon candidates, fills the denominator histograms from the leading
//! candidate, then applies the tighter (numerator) gate and fills the
//! numerator histograms from the same candidate.
//!
//! The lifecycle is explicit and host-agnostic:
//!
//! ```no_run
//! use dqm_core::{Event, RunContext};
//! use dqm_monitor::{MonitorConfig, MuonMonitor};
//!
//! let config = MonitorConfig::from_path("muon_monitor.yaml".as_ref()).unwrap();
//! let monitor = MuonMonitor::new(config).unwrap();
//! let mut run = monitor.start_run(&RunContext::new(362_000)).unwrap();
//! let event = Event::new(362_000, 12, 1);
//! let outcome = monitor.process_event(&mut run, &event).unwrap();
//! println!("{outcome:?}");
//! let output = run.finish();
//! println!("{} histograms", output.registry.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod monitor;
pub mod outcome;

pub use config::{AxisConfig, HistogramConfig, InputTags, LumiBinning, MonitorConfig};
pub use monitor::{HIST_NAMES, MonitorRun, MuonMonitor, RunOutput, reference_point};
pub use outcome::{EventOutcome, RunSummary};
