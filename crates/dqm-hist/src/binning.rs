//! One-dimensional axis binnings.

use dqm_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest number of in-range bins on one axis.
pub const MAX_BINS: usize = 1_000_000;

/// Largest flow-inclusive cell count of a 2-D histogram.
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Validated axis binning: either `n` equal-width bins over `[low, high)`
/// or explicit, strictly increasing bin edges.
///
/// In configuration files a binning is written either as
/// `{nbins, xmin, xmax}` or as a plain list of edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBinning", into = "RawBinning")]
pub struct BinningSpec {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Uniform { n_bins: usize, low: f64, high: f64 },
    Variable { edges: Vec<f64> },
}

/// Where a value falls on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinIndex {
    /// Below the first edge.
    Underflow,
    /// In-range bin, 0-based.
    Bin(usize),
    /// At or above the last edge, or NaN.
    Overflow,
}

impl BinningSpec {
    /// `n_bins` equal-width bins over `[low, high)`.
    pub fn uniform(n_bins: usize, low: f64, high: f64) -> Result<Self> {
        if n_bins < 1 {
            return Err(Error::Binning(format!("bin count must be >= 1 (got {n_bins})")));
        }
        if n_bins > MAX_BINS {
            return Err(Error::Binning(format!("bin count {n_bins} exceeds the limit of {MAX_BINS}")));
        }
        if !low.is_finite() || !high.is_finite() {
            return Err(Error::Binning(format!("axis range must be finite (got [{low}, {high}])")));
        }
        if low >= high {
            return Err(Error::Binning(format!(
                "lower edge must be below upper edge (got [{low}, {high}])"
            )));
        }
        Ok(Self { kind: Kind::Uniform { n_bins, low, high } })
    }

    /// Explicit bin edges; at least two, finite, strictly increasing.
    pub fn variable(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Binning(format!(
                "variable binning needs at least 2 edges (got {})",
                edges.len()
            )));
        }
        if edges.len() - 1 > MAX_BINS {
            return Err(Error::Binning(format!(
                "{} variable bins exceed the limit of {MAX_BINS}",
                edges.len() - 1
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(Error::Binning(format!("bin edge must be finite (got {bad})")));
        }
        if let Some(i) = edges.windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::Binning(format!(
                "bin edges must be strictly increasing (edge {} = {} is followed by {})",
                i,
                edges[i],
                edges[i + 1]
            )));
        }
        Ok(Self { kind: Kind::Variable { edges } })
    }

    /// Number of in-range bins.
    pub fn n_bins(&self) -> usize {
        match &self.kind {
            Kind::Uniform { n_bins, .. } => *n_bins,
            Kind::Variable { edges } => edges.len() - 1,
        }
    }

    /// Flow-inclusive cell count of an `x` × `y` grid, if within
    /// [`MAX_GRID_CELLS`].
    pub fn grid_cells(x: &BinningSpec, y: &BinningSpec) -> Result<usize> {
        (x.n_bins() + 2)
            .checked_mul(y.n_bins() + 2)
            .filter(|&cells| cells <= MAX_GRID_CELLS)
            .ok_or_else(|| {
                Error::Binning(format!(
                    "{} x {} grid exceeds the limit of {MAX_GRID_CELLS} cells",
                    x.n_bins(),
                    y.n_bins()
                ))
            })
    }

    /// Lower edge of the first bin.
    pub fn low(&self) -> f64 {
        match &self.kind {
            Kind::Uniform { low, .. } => *low,
            Kind::Variable { edges } => edges[0],
        }
    }

    /// Upper edge of the last bin.
    pub fn high(&self) -> f64 {
        match &self.kind {
            Kind::Uniform { high, .. } => *high,
            Kind::Variable { edges } => edges[edges.len() - 1],
        }
    }

    /// True for explicit-edge binnings.
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, Kind::Variable { .. })
    }

    /// All bin edges (length = `n_bins() + 1`).
    pub fn edges(&self) -> Vec<f64> {
        match &self.kind {
            Kind::Uniform { n_bins, low, high } => {
                let width = (high - low) / *n_bins as f64;
                (0..=*n_bins).map(|i| if i == *n_bins { *high } else { low + width * i as f64 }).collect()
            }
            Kind::Variable { edges } => edges.clone(),
        }
    }

    /// Locate `x` on the axis. Lower edges are inclusive.
    pub fn find_bin(&self, x: f64) -> BinIndex {
        if x.is_nan() || x >= self.high() {
            return BinIndex::Overflow;
        }
        if x < self.low() {
            return BinIndex::Underflow;
        }
        match &self.kind {
            Kind::Uniform { n_bins, low, high } => {
                let idx = ((x - low) / (high - low) * *n_bins as f64) as usize;
                BinIndex::Bin(idx.min(n_bins - 1))
            }
            Kind::Variable { edges } => {
                match edges.binary_search_by(|e| e.total_cmp(&x)) {
                    Ok(i) => BinIndex::Bin(i),
                    Err(i) => BinIndex::Bin(i - 1),
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawBinning {
    Uniform { nbins: i64, xmin: f64, xmax: f64 },
    Edges(Vec<f64>),
}

impl TryFrom<RawBinning> for BinningSpec {
    type Error = Error;

    fn try_from(raw: RawBinning) -> Result<Self> {
        match raw {
            RawBinning::Uniform { nbins, xmin, xmax } => {
                let n = usize::try_from(nbins).map_err(|_| {
                    Error::Binning(format!("bin count must be >= 1 (got {nbins})"))
                })?;
                BinningSpec::uniform(n, xmin, xmax)
            }
            RawBinning::Edges(edges) => BinningSpec::variable(edges),
        }
    }
}

impl From<BinningSpec> for RawBinning {
    fn from(spec: BinningSpec) -> Self {
        match spec.kind {
            Kind::Uniform { n_bins, low, high } => {
                RawBinning::Uniform { nbins: n_bins as i64, xmin: low, xmax: high }
            }
            Kind::Variable { edges } => RawBinning::Edges(edges),
        }
    }
}
