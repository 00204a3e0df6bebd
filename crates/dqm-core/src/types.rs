//! Reconstructed physics objects read by the monitor.
//!
//! All momenta are in GeV, positions in cm, angles in radians.

use serde::{Deserialize, Serialize};

/// A point in detector coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
    /// z coordinate
    pub z: f64,
}

impl Point3 {
    /// The coordinate origin.
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Reconstructed track: momentum at its reference point plus the
/// reference point itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Reference point x.
    #[serde(default)]
    pub vx: f64,
    /// Reference point y.
    #[serde(default)]
    pub vy: f64,
    /// Reference point z.
    #[serde(default)]
    pub vz: f64,
}

impl Track {
    /// Build a track whose transverse and longitudinal impact parameters
    /// with respect to the origin are `dxy` and `dz`.
    ///
    /// The reference point is placed at the point of closest transverse
    /// approach to the origin.
    pub fn from_impact(pt: f64, eta: f64, phi: f64, dxy: f64, dz: f64) -> Self {
        Self { pt, eta, phi, vx: -dxy * phi.sin(), vy: dxy * phi.cos(), vz: dz }
    }

    /// x component of momentum.
    pub fn px(&self) -> f64 {
        self.pt * self.phi.cos()
    }

    /// y component of momentum.
    pub fn py(&self) -> f64 {
        self.pt * self.phi.sin()
    }

    /// z component of momentum.
    pub fn pz(&self) -> f64 {
        self.pt * self.eta.sinh()
    }

    /// Signed transverse impact parameter with respect to `p`.
    pub fn dxy(&self, p: &Point3) -> f64 {
        (-(self.vx - p.x) * self.py() + (self.vy - p.y) * self.px()) / self.pt
    }

    /// Longitudinal impact parameter with respect to `p`.
    pub fn dz(&self, p: &Point3) -> f64 {
        let transverse = ((self.vx - p.x) * self.px() + (self.vy - p.y) * self.py()) / self.pt;
        (self.vz - p.z) - transverse * self.pz() / self.pt
    }
}

/// Reconstructed muon candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Muon {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Electric charge (+1 / -1).
    #[serde(default)]
    pub charge: i32,
    /// Reconstructed as a global muon.
    #[serde(default)]
    pub is_global_muon: bool,
    /// Reconstructed as a tracker muon.
    #[serde(default)]
    pub is_tracker_muon: bool,
    /// Identified by particle flow.
    #[serde(default, rename = "isPFMuon")]
    pub is_pf_muon: bool,
    /// Best track used for impact-parameter measurements.
    #[serde(default)]
    pub best_track: Option<Track>,
}

impl Muon {
    /// Muon with the given kinematics and no track or identification flags.
    pub fn new(pt: f64, eta: f64, phi: f64) -> Self {
        Self {
            pt,
            eta,
            phi,
            charge: 0,
            is_global_muon: false,
            is_tracker_muon: false,
            is_pf_muon: false,
            best_track: None,
        }
    }

    /// Attach a best track.
    pub fn with_track(mut self, track: Track) -> Self {
        self.best_track = Some(track);
        self
    }

    /// Momentum magnitude.
    pub fn p(&self) -> f64 {
        self.pt * self.eta.cosh()
    }

    /// x component of momentum.
    pub fn px(&self) -> f64 {
        self.pt * self.phi.cos()
    }

    /// y component of momentum.
    pub fn py(&self) -> f64 {
        self.pt * self.phi.sin()
    }

    /// z component of momentum.
    pub fn pz(&self) -> f64 {
        self.pt * self.eta.sinh()
    }
}

/// Missing transverse energy reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Met {
    /// Magnitude.
    pub pt: f64,
    /// Azimuth.
    #[serde(default)]
    pub phi: f64,
    /// Scalar sum of transverse energy.
    #[serde(default)]
    pub sum_et: f64,
}

impl Met {
    /// MET reading with the given magnitude and direction.
    pub fn new(pt: f64, phi: f64) -> Self {
        Self { pt, phi, sum_et: 0.0 }
    }
}

/// Reconstructed interaction vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex {
    /// Position x.
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Position z.
    pub z: f64,
    /// Placeholder vertex (e.g. the beam spot) rather than a fitted one.
    #[serde(default)]
    pub is_fake: bool,
}

impl Vertex {
    /// A fitted vertex at the given position.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, is_fake: false }
    }

    /// A fake vertex at the given position.
    pub fn fake(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, is_fake: true }
    }

    /// Vertex position.
    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn impact_parameters_from_perigee() {
        let t = Track::from_impact(35.0, 0.4, 1.0, 0.01, 0.02);
        assert_relative_eq!(t.dxy(&Point3::ORIGIN), 0.01, epsilon = 1e-12);
        assert_relative_eq!(t.dz(&Point3::ORIGIN), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn impact_parameters_shift_with_reference() {
        let t = Track { pt: 10.0, eta: 0.0, phi: 0.0, vx: 0.0, vy: 0.5, vz: 1.0 };
        // Momentum along +x: dxy is the y offset, dz the z offset.
        assert_relative_eq!(t.dxy(&Point3::ORIGIN), 0.5, epsilon = 1e-12);
        assert_relative_eq!(t.dxy(&Point3::new(0.0, 0.2, 0.0)), 0.3, epsilon = 1e-12);
        assert_relative_eq!(t.dz(&Point3::new(0.0, 0.0, 0.25)), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn muon_momentum_components() {
        let m = Muon::new(10.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(m.px(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.py(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(m.pz(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.p(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn muon_deserializes_with_defaults() {
        let m: Muon =
            serde_json::from_str(r#"{"pt": 20.0, "eta": 1.1, "phi": -0.3, "isPFMuon": true}"#)
                .unwrap();
        assert!(m.is_pf_muon);
        assert!(!m.is_global_muon);
        assert!(m.best_track.is_none());
    }
}
