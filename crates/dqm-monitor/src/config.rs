//! Monitor configuration (YAML or JSON).
//!
//! Field names follow the monitoring configuration surface:
//!
//! ```yaml
//! folderName: HLT/Muon
//! inputTags: { met: pfMet, muons: muons, vertices: offlinePrimaryVertices }
//! histogramConfig:
//!   muonPSet: { nbins: 100, xmin: 0.0, xmax: 500.0 }   # required
//!   muonBinning: [0, 20, 40, 60, 1000]
//!   lsPSet: { nbins: 2500 }
//! eventSelection: "pt > 0"
//! candidateSelection: "pt > 6 && eta < 2.4"
//! minimumCandidateCount: 1
//! numeratorGate:
//!   highLevel: { paths: ["HLT_IsoMu24_v*"] }
//! denominatorGate:
//!   highLevel: { paths: ["HLT_PFMET120_PFMHT120_IDTight_v*"] }
//! ```

use std::path::Path;

use dqm_core::{InputTag, Result};
use dqm_hist::BinningSpec;
use dqm_trigger::GateConfig;
use serde::{Deserialize, Serialize};

/// Uniform axis description `{nbins, xmin, xmax}`.
///
/// Kept unvalidated here; building a monitor validates every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Number of bins.
    pub nbins: i64,
    /// Lower edge.
    pub xmin: f64,
    /// Upper edge.
    pub xmax: f64,
}

impl AxisConfig {
    /// Axis with `nbins` bins over `[xmin, xmax)`.
    pub const fn new(nbins: i64, xmin: f64, xmax: f64) -> Self {
        Self { nbins, xmin, xmax }
    }

    /// Validated binning.
    pub fn binning(&self) -> Result<BinningSpec> {
        let n = usize::try_from(self.nbins).unwrap_or(0);
        BinningSpec::uniform(n, self.xmin, self.xmax)
    }
}

/// Lumisection-block axis: `nbins` unit-width bins over `[0, nbins)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LumiBinning {
    /// Number of lumisection blocks.
    #[serde(default = "default_ls_bins")]
    pub nbins: i64,
}

impl Default for LumiBinning {
    fn default() -> Self {
        Self { nbins: default_ls_bins() }
    }
}

impl LumiBinning {
    /// Validated binning.
    pub fn binning(&self) -> Result<BinningSpec> {
        AxisConfig::new(self.nbins, 0.0, self.nbins as f64).binning()
    }
}

/// Input collection tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct InputTags {
    /// MET collection.
    pub met: InputTag,
    /// Muon collection.
    pub muons: InputTag,
    /// Vertex collection.
    pub vertices: InputTag,
}

impl Default for InputTags {
    fn default() -> Self {
        Self {
            met: InputTag::new("pfMet"),
            muons: InputTag::new("muons"),
            vertices: InputTag::new("offlinePrimaryVertices"),
        }
    }
}

/// Binning of every booked histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HistogramConfig {
    /// Fixed-width muon pT axis; also the y range of the pT-vs-LS profile.
    #[serde(rename = "muonPSet")]
    pub muon_pset: AxisConfig,
    /// Variable muon pT edges.
    #[serde(default = "default_muon_binning")]
    pub muon_binning: Vec<f64>,
    /// Variable muon eta edges.
    #[serde(rename = "muonetaBinning", default = "default_muon_eta_binning")]
    pub muon_eta_binning: Vec<f64>,
    /// Lumisection-block axis.
    #[serde(rename = "lsPSet", default)]
    pub ls_pset: LumiBinning,
    /// Muon phi axis.
    #[serde(rename = "phiPSet", default = "default_phi")]
    pub phi_pset: AxisConfig,
    /// Fixed-width muon eta axis.
    #[serde(rename = "etaPSet", default = "default_eta")]
    pub eta_pset: AxisConfig,
    /// Transverse impact parameter axis.
    #[serde(rename = "dxyPSet", default = "default_impact")]
    pub dxy_pset: AxisConfig,
    /// Longitudinal impact parameter axis.
    #[serde(rename = "dzPSet", default = "default_impact")]
    pub dz_pset: AxisConfig,
}

impl HistogramConfig {
    /// Defaults for everything but the required muon pT axis.
    pub fn new(muon_pset: AxisConfig) -> Self {
        Self {
            muon_pset,
            muon_binning: default_muon_binning(),
            muon_eta_binning: default_muon_eta_binning(),
            ls_pset: LumiBinning::default(),
            phi_pset: default_phi(),
            eta_pset: default_eta(),
            dxy_pset: default_impact(),
            dz_pset: default_impact(),
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonitorConfig {
    /// Folder all histograms are booked under.
    #[serde(default = "default_folder")]
    pub folder_name: String,
    /// Input collection tags.
    #[serde(default)]
    pub input_tags: InputTags,
    /// Histogram binning.
    pub histogram_config: HistogramConfig,
    /// Cut applied to the leading MET reading.
    #[serde(default = "default_event_selection")]
    pub event_selection: String,
    /// Cut applied to each muon candidate.
    #[serde(default = "default_candidate_selection")]
    pub candidate_selection: String,
    /// Minimum number of muons, before and after the candidate cut.
    #[serde(default)]
    pub minimum_candidate_count: u32,
    /// Tighter gate, applied after the denominator fill.
    #[serde(default)]
    pub numerator_gate: GateConfig,
    /// Reference gate.
    #[serde(default)]
    pub denominator_gate: GateConfig,
}

impl MonitorConfig {
    /// Defaults for everything but the required muon pT axis.
    pub fn new(muon_pset: AxisConfig) -> Self {
        Self {
            folder_name: default_folder(),
            input_tags: InputTags::default(),
            histogram_config: HistogramConfig::new(muon_pset),
            event_selection: default_event_selection(),
            candidate_selection: default_candidate_selection(),
            minimum_candidate_count: 0,
            numerator_gate: GateConfig::default(),
            denominator_gate: GateConfig::default(),
        }
    }

    /// Parse YAML (JSON is accepted too, being a subset).
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Read a `.json` file as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        let cfg = if ext == "json" {
            serde_json::from_slice(&bytes)?
        } else {
            serde_yaml_ng::from_slice(&bytes)?
        };
        Ok(cfg)
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

fn default_folder() -> String {
    "HLT/Muon".to_string()
}

fn default_event_selection() -> String {
    "pt > 0".to_string()
}

fn default_candidate_selection() -> String {
    "pt > 6 && eta < 2.4".to_string()
}

fn default_ls_bins() -> i64 {
    2500
}

fn default_muon_binning() -> Vec<f64> {
    vec![
        0., 20., 40., 60., 80., 90., 100., 110., 120., 130., 140., 150., 160., 170., 180., 190.,
        200., 220., 240., 260., 280., 300., 350., 400., 450., 1000.,
    ]
}

fn default_muon_eta_binning() -> Vec<f64> {
    vec![-3., -2.5, -2., -1.5, -1., -0.5, 0., 0.5, 1., 1.5, 2., 2.5, 3.]
}

fn default_phi() -> AxisConfig {
    AxisConfig::new(64, -3.2, 3.2)
}

fn default_eta() -> AxisConfig {
    AxisConfig::new(68, -2.4, 2.4)
}

fn default_impact() -> AxisConfig {
    AxisConfig::new(50, -2.5, 2.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_gets_defaults() {
        let cfg = MonitorConfig::from_yaml_str(
            "histogramConfig:\n  muonPSet: {nbins: 100, xmin: 0.0, xmax: 500.0}\n",
        )
        .unwrap();
        assert_eq!(cfg.folder_name, "HLT/Muon");
        assert_eq!(cfg.input_tags.vertices.as_str(), "offlinePrimaryVertices");
        assert_eq!(cfg.event_selection, "pt > 0");
        assert_eq!(cfg.minimum_candidate_count, 0);
        assert_eq!(cfg.histogram_config.ls_pset.nbins, 2500);
        assert_eq!(cfg.histogram_config.muon_binning.len(), 26);
        assert_eq!(cfg.histogram_config.phi_pset, AxisConfig::new(64, -3.2, 3.2));
        assert_eq!(cfg, MonitorConfig::new(AxisConfig::new(100, 0.0, 500.0)));
    }

    #[test]
    fn muon_pset_is_required() {
        let err = MonitorConfig::from_yaml_str("folderName: X\nhistogramConfig: {}\n").unwrap_err();
        assert!(err.to_string().contains("muonPSet"), "{err}");
        assert!(MonitorConfig::from_yaml_str("folderName: X\n").is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let text = "histogramConfig:\n  muonPSet: {nbins: 1, xmin: 0, xmax: 1}\nnmuons: 2\n";
        assert!(MonitorConfig::from_yaml_str(text).is_err());
    }

    #[test]
    fn lumi_axis_upper_edge_is_bin_count() {
        let b = LumiBinning { nbins: 10 }.binning().unwrap();
        assert_eq!(b.n_bins(), 10);
        assert_eq!(b.high(), 10.0);
        assert!(LumiBinning { nbins: 0 }.binning().is_err());
    }

    #[test]
    fn negative_bin_count_rejected() {
        assert!(AxisConfig::new(-5, 0.0, 1.0).binning().is_err());
    }

    #[test]
    fn yaml_round_trip_of_defaults() {
        let cfg = MonitorConfig::new(AxisConfig::new(40, 0.0, 200.0));
        let back = MonitorConfig::from_yaml_str(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(cfg, back);
    }
}
