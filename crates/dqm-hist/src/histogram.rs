//! Histogram types held by the registry.

use serde::Serialize;

use crate::binning::{BinIndex, BinningSpec};

/// Flow-inclusive slot: 0 = underflow, 1..=n = bins, n + 1 = overflow.
fn slot(axis: &BinningSpec, x: f64) -> usize {
    match axis.find_bin(x) {
        BinIndex::Underflow => 0,
        BinIndex::Bin(b) => b + 1,
        BinIndex::Overflow => axis.n_bins() + 1,
    }
}

/// A 1-D histogram.
#[derive(Debug, Clone, Serialize)]
pub struct Hist1D {
    /// X axis binning.
    pub axis: BinningSpec,
    /// Bin contents (sum of weights), excluding under/overflow.
    pub bin_content: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sumw2: Vec<f64>,
    /// Underflow sum of weights.
    pub underflow: f64,
    /// Overflow sum of weights.
    pub overflow: f64,
    /// Number of fill calls, including under/overflow.
    pub entries: u64,
}

impl Hist1D {
    /// Empty histogram over `axis`.
    pub fn new(axis: BinningSpec) -> Self {
        let n = axis.n_bins();
        Self {
            axis,
            bin_content: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Add `x` with unit weight.
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Add `x` with weight `w`.
    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        self.entries += 1;
        match self.axis.find_bin(x) {
            BinIndex::Underflow => self.underflow += w,
            BinIndex::Overflow => self.overflow += w,
            BinIndex::Bin(b) => {
                self.bin_content[b] += w;
                self.sumw2[b] += w * w;
            }
        }
    }

    /// Content of the bin containing `x` (under/overflow included).
    pub fn content_at(&self, x: f64) -> f64 {
        match self.axis.find_bin(x) {
            BinIndex::Underflow => self.underflow,
            BinIndex::Overflow => self.overflow,
            BinIndex::Bin(b) => self.bin_content[b],
        }
    }

    /// Sum of in-range contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }
}

/// A 2-D histogram over a flow-inclusive grid.
#[derive(Debug, Clone, Serialize)]
pub struct Hist2D {
    /// X axis binning.
    pub x_axis: BinningSpec,
    /// Y axis binning.
    pub y_axis: BinningSpec,
    /// Contents, row-major in y: `content[iy * (nx + 2) + ix]`, flow slots included.
    pub content: Vec<f64>,
    /// Sum of squared weights, same layout as `content`.
    pub sumw2: Vec<f64>,
    /// Number of fill calls.
    pub entries: u64,
}

impl Hist2D {
    /// Empty histogram over `x_axis` × `y_axis`.
    pub fn new(x_axis: BinningSpec, y_axis: BinningSpec) -> Self {
        let cells = (x_axis.n_bins() + 2) * (y_axis.n_bins() + 2);
        Self { x_axis, y_axis, content: vec![0.0; cells], sumw2: vec![0.0; cells], entries: 0 }
    }

    fn cell(&self, x: f64, y: f64) -> usize {
        slot(&self.y_axis, y) * (self.x_axis.n_bins() + 2) + slot(&self.x_axis, x)
    }

    /// Add `(x, y)` with unit weight.
    pub fn fill(&mut self, x: f64, y: f64) {
        self.entries += 1;
        let c = self.cell(x, y);
        self.content[c] += 1.0;
        self.sumw2[c] += 1.0;
    }

    /// Content of the cell containing `(x, y)`.
    pub fn content_at(&self, x: f64, y: f64) -> f64 {
        self.content[self.cell(x, y)]
    }

    /// Sum of in-range contents.
    pub fn integral(&self) -> f64 {
        let nx = self.x_axis.n_bins();
        let ny = self.y_axis.n_bins();
        (1..=ny).flat_map(|iy| (1..=nx).map(move |ix| iy * (nx + 2) + ix)).map(|c| self.content[c]).sum()
    }
}

/// Profile histogram: mean of `y` per `x` bin.
///
/// When `y_low < y_high`, fills with `y` outside `[y_low, y_high]` (or NaN)
/// are ignored entirely.
#[derive(Debug, Clone, Serialize)]
pub struct Profile1D {
    /// X axis binning.
    pub axis: BinningSpec,
    /// Lower accepted y.
    pub y_low: f64,
    /// Upper accepted y.
    pub y_high: f64,
    /// Σw per flow-inclusive x slot.
    pub sum_w: Vec<f64>,
    /// Σw·y per flow-inclusive x slot.
    pub sum_wy: Vec<f64>,
    /// Σw·y² per flow-inclusive x slot.
    pub sum_wy2: Vec<f64>,
    /// Number of accepted fills.
    pub entries: u64,
}

impl Profile1D {
    /// Empty profile over `axis` accepting `y` in `[y_low, y_high]`.
    pub fn new(axis: BinningSpec, y_low: f64, y_high: f64) -> Self {
        let n = axis.n_bins() + 2;
        Self {
            axis,
            y_low,
            y_high,
            sum_w: vec![0.0; n],
            sum_wy: vec![0.0; n],
            sum_wy2: vec![0.0; n],
            entries: 0,
        }
    }

    /// Add `y` to the bin containing `x`.
    pub fn fill(&mut self, x: f64, y: f64) {
        if self.y_low < self.y_high && !(y >= self.y_low && y <= self.y_high) {
            return;
        }
        self.entries += 1;
        let s = slot(&self.axis, x);
        self.sum_w[s] += 1.0;
        self.sum_wy[s] += y;
        self.sum_wy2[s] += y * y;
    }

    /// Mean y in in-range bin `bin` (0-based); `None` for an empty bin.
    pub fn mean(&self, bin: usize) -> Option<f64> {
        let w = *self.sum_w.get(bin + 1)?;
        (w > 0.0).then(|| self.sum_wy[bin + 1] / w)
    }

    /// Standard deviation of y in in-range bin `bin`; `None` for an empty bin.
    pub fn spread(&self, bin: usize) -> Option<f64> {
        let mean = self.mean(bin)?;
        let var = self.sum_wy2[bin + 1] / self.sum_w[bin + 1] - mean * mean;
        Some(var.max(0.0).sqrt())
    }

    /// Number of fills accepted into the bin containing `x`.
    pub fn count_at(&self, x: f64) -> f64 {
        self.sum_w[slot(&self.axis, x)]
    }
}

/// Histogram payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistData {
    /// 1-D histogram.
    H1(Hist1D),
    /// 2-D histogram.
    H2(Hist2D),
    /// Profile histogram.
    Profile(Profile1D),
}

impl HistData {
    /// Number of entries recorded.
    pub fn entries(&self) -> u64 {
        match self {
            HistData::H1(h) => h.entries,
            HistData::H2(h) => h.entries,
            HistData::Profile(h) => h.entries,
        }
    }
}

/// A named, titled histogram stored in the registry.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorElement {
    /// Full path, `<folder>/<name>`.
    pub path: String,
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// X axis title.
    pub x_title: String,
    /// Y axis title.
    pub y_title: String,
    /// Contents.
    #[serde(flatten)]
    pub data: HistData,
}

impl MonitorElement {
    /// Number of entries recorded.
    pub fn entries(&self) -> u64 {
        self.data.entries()
    }

    /// The 1-D payload, if this is a 1-D histogram.
    pub fn as_h1(&self) -> Option<&Hist1D> {
        match &self.data {
            HistData::H1(h) => Some(h),
            _ => None,
        }
    }

    /// The 2-D payload, if this is a 2-D histogram.
    pub fn as_h2(&self) -> Option<&Hist2D> {
        match &self.data {
            HistData::H2(h) => Some(h),
            _ => None,
        }
    }

    /// The profile payload, if this is a profile.
    pub fn as_profile(&self) -> Option<&Profile1D> {
        match &self.data {
            HistData::Profile(h) => Some(h),
            _ => None,
        }
    }
}
