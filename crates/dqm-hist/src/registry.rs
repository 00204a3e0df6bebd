//! Numerator/denominator histogram pairs booked under one folder.
//!
//! A registry is created per run and owned by exactly one processing
//! stream. Booking hands out [`PairId`] handles; filling goes through the
//! handle, so the registry can reject handles it never booked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dqm_core::{Error, Result};
use serde::Serialize;

use crate::binning::BinningSpec;
use crate::histogram::{Hist1D, Hist2D, HistData, MonitorElement, Profile1D};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Which half of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Events passing the tighter selection.
    Numerator,
    /// Events passing the reference selection.
    Denominator,
}

impl Side {
    fn suffix(self) -> &'static str {
        match self {
            Side::Numerator => "numerator",
            Side::Denominator => "denominator",
        }
    }
}

/// Handle to a booked pair. Only valid for the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairId {
    registry: u64,
    numerator: usize,
    denominator: usize,
}

/// Coordinates of one fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPoint {
    /// 1-D fill.
    X(f64),
    /// 2-D or profile fill.
    XY(f64, f64),
}

impl From<f64> for FillPoint {
    fn from(x: f64) -> Self {
        FillPoint::X(x)
    }
}

impl From<(f64, f64)> for FillPoint {
    fn from((x, y): (f64, f64)) -> Self {
        FillPoint::XY(x, y)
    }
}

/// Name, title and axis titles for a booked pair.
#[derive(Debug, Clone)]
pub struct Labels {
    /// Base name; the pair is stored as `<name>_numerator` / `<name>_denominator`.
    pub name: String,
    /// Base title.
    pub title: String,
    /// X axis title.
    pub x_title: String,
    /// Y axis title.
    pub y_title: String,
}

impl Labels {
    /// Labels with empty axis titles.
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self { name: name.into(), title: title.into(), x_title: String::new(), y_title: String::new() }
    }

    /// Set both axis titles.
    pub fn axes(mut self, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
        self.x_title = x_title.into();
        self.y_title = y_title.into();
        self
    }
}

/// Serializable copy of a registry's contents.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    /// Folder all histograms live under.
    pub folder: String,
    /// Histograms in booking order.
    pub histograms: Vec<MonitorElement>,
}

/// Owner of all histograms booked for one run.
#[derive(Debug)]
pub struct HistogramRegistry {
    id: u64,
    folder: String,
    elements: Vec<MonitorElement>,
    by_path: HashMap<String, usize>,
}

impl HistogramRegistry {
    /// Empty registry booking under `folder`.
    pub fn new(folder: impl Into<String>) -> Self {
        let folder = folder.into().trim_end_matches('/').to_string();
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            folder,
            elements: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Folder prefix.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Book a 1-D pair.
    pub fn book_1d(&mut self, labels: &Labels, axis: &BinningSpec) -> Result<PairId> {
        self.book(labels, || HistData::H1(Hist1D::new(axis.clone())))
    }

    /// Book a 2-D pair.
    pub fn book_2d(
        &mut self,
        labels: &Labels,
        x_axis: &BinningSpec,
        y_axis: &BinningSpec,
    ) -> Result<PairId> {
        BinningSpec::grid_cells(x_axis, y_axis)?;
        self.book(labels, || HistData::H2(Hist2D::new(x_axis.clone(), y_axis.clone())))
    }

    /// Book a profile pair accepting `y` in `[y_low, y_high]`.
    pub fn book_profile(
        &mut self,
        labels: &Labels,
        axis: &BinningSpec,
        y_low: f64,
        y_high: f64,
    ) -> Result<PairId> {
        if y_low.is_nan() || y_high.is_nan() || y_low > y_high {
            return Err(Error::Booking(format!(
                "profile '{}': invalid y range [{y_low}, {y_high}]",
                labels.name
            )));
        }
        self.book(labels, || HistData::Profile(Profile1D::new(axis.clone(), y_low, y_high)))
    }

    fn book(&mut self, labels: &Labels, make: impl Fn() -> HistData) -> Result<PairId> {
        let numerator = self.insert(labels, Side::Numerator, make())?;
        let denominator = self.insert(labels, Side::Denominator, make())?;
        log::debug!("booked pair '{}/{}'", self.folder, labels.name);
        Ok(PairId { registry: self.id, numerator, denominator })
    }

    fn insert(&mut self, labels: &Labels, side: Side, data: HistData) -> Result<usize> {
        let name = format!("{}_{}", labels.name, side.suffix());
        let path = if self.folder.is_empty() { name.clone() } else { format!("{}/{}", self.folder, name) };
        if self.by_path.contains_key(&path) {
            return Err(Error::Booking(format!("'{path}' is already booked")));
        }
        let idx = self.elements.len();
        self.elements.push(MonitorElement {
            path: path.clone(),
            name,
            title: format!("{} ({})", labels.title, side.suffix()),
            x_title: labels.x_title.clone(),
            y_title: labels.y_title.clone(),
            data,
        });
        self.by_path.insert(path, idx);
        Ok(idx)
    }

    /// Fill the denominator half of `pair`.
    pub fn fill_denominator(&mut self, pair: PairId, point: impl Into<FillPoint>) -> Result<()> {
        self.fill(pair, Side::Denominator, point.into())
    }

    /// Fill the numerator half of `pair`.
    pub fn fill_numerator(&mut self, pair: PairId, point: impl Into<FillPoint>) -> Result<()> {
        self.fill(pair, Side::Numerator, point.into())
    }

    /// Fill one half of `pair`.
    ///
    /// Fails if `pair` was issued by another registry or if the point's
    /// dimension does not match the booked histogram.
    pub fn fill(&mut self, pair: PairId, side: Side, point: FillPoint) -> Result<()> {
        if pair.registry != self.id {
            return Err(Error::Booking(format!(
                "pair handle was not booked in registry '{}'",
                self.folder
            )));
        }
        let idx = match side {
            Side::Numerator => pair.numerator,
            Side::Denominator => pair.denominator,
        };
        let me = &mut self.elements[idx];
        match (&mut me.data, point) {
            (HistData::H1(h), FillPoint::X(x)) => h.fill(x),
            (HistData::H2(h), FillPoint::XY(x, y)) => h.fill(x, y),
            (HistData::Profile(h), FillPoint::XY(x, y)) => h.fill(x, y),
            (_, point) => {
                return Err(Error::Booking(format!(
                    "'{}' cannot be filled with {point:?}",
                    me.path
                )));
            }
        }
        Ok(())
    }

    /// Histogram at full path `<folder>/<name>`.
    pub fn get(&self, path: &str) -> Option<&MonitorElement> {
        self.by_path.get(path).map(|&i| &self.elements[i])
    }

    /// `(numerator, denominator)` for a handle issued by this registry.
    pub fn pair(&self, pair: PairId) -> Option<(&MonitorElement, &MonitorElement)> {
        (pair.registry == self.id)
            .then(|| (&self.elements[pair.numerator], &self.elements[pair.denominator]))
    }

    /// Entry count of the histogram at `path`.
    pub fn total_entries(&self, path: &str) -> Option<u64> {
        self.get(path).map(MonitorElement::entries)
    }

    /// Histograms in booking order.
    pub fn iter(&self) -> impl Iterator<Item = &MonitorElement> {
        self.elements.iter()
    }

    /// Number of booked histograms (two per pair).
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True before anything is booked.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serializable copy of all histograms.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot { folder: self.folder.clone(), histograms: self.elements.clone() }
    }
}
