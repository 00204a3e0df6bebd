//! # dqm-hist
//!
//! Histogram storage for the monitor: validated axis binnings, 1-D / 2-D /
//! profile histograms, and a registry that books numerator/denominator
//! pairs under a folder and fills them by handle.
//!
//! ## Example
//!
//! ```
//! use dqm_hist::{BinningSpec, HistogramRegistry, Labels};
//!
//! let mut reg = HistogramRegistry::new("HLT/Muon");
//! let pt = BinningSpec::uniform(10, 0.0, 100.0).unwrap();
//! let pair = reg.book_1d(&Labels::new("muon_pt", "muon PT"), &pt).unwrap();
//! reg.fill_denominator(pair, 35.0).unwrap();
//! assert_eq!(reg.total_entries("HLT/Muon/muon_pt_denominator"), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binning;
pub mod histogram;
pub mod registry;

pub use binning::{BinIndex, BinningSpec, MAX_BINS, MAX_GRID_CELLS};
pub use histogram::{Hist1D, Hist2D, HistData, MonitorElement, Profile1D};
pub use registry::{FillPoint, HistogramRegistry, Labels, PairId, RegistrySnapshot, Side};
