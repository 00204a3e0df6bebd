//! Field accessor tables: the names a cut string may use per object type.

use dqm_core::{Met, Muon, Point3};

const MUON_MASS: f64 = 0.105_658_375_5;

/// A named numeric accessor on `T`. Booleans read as 1.0 / 0.0.
pub struct Field<T> {
    /// Name used in cut strings.
    pub name: &'static str,
    /// Accessor.
    pub get: fn(&T) -> f64,
}

/// Object types that selectors can be compiled for.
pub trait Selectable: Sized + 'static {
    /// Type name used in error messages.
    const KIND: &'static str;

    /// Every field a cut string may reference.
    const FIELDS: &'static [Field<Self>];

    /// Accessor for `name`, if the type has such a field.
    fn field(name: &str) -> Option<fn(&Self) -> f64> {
        Self::FIELDS.iter().find(|f| f.name == name).map(|f| f.get)
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl Selectable for Muon {
    const KIND: &'static str = "muon";

    const FIELDS: &'static [Field<Muon>] = &[
        Field { name: "pt", get: |m| m.pt },
        Field { name: "eta", get: |m| m.eta },
        Field { name: "phi", get: |m| m.phi },
        Field { name: "px", get: |m| m.px() },
        Field { name: "py", get: |m| m.py() },
        Field { name: "pz", get: |m| m.pz() },
        Field { name: "p", get: |m| m.p() },
        Field { name: "energy", get: |m| (m.p() * m.p() + MUON_MASS * MUON_MASS).sqrt() },
        Field { name: "charge", get: |m| f64::from(m.charge) },
        Field { name: "isGlobalMuon", get: |m| flag(m.is_global_muon) },
        Field { name: "isTrackerMuon", get: |m| flag(m.is_tracker_muon) },
        Field { name: "isPFMuon", get: |m| flag(m.is_pf_muon) },
        Field {
            name: "dxy",
            get: |m| m.best_track.as_ref().map_or(f64::NAN, |t| t.dxy(&Point3::ORIGIN)),
        },
        Field {
            name: "dz",
            get: |m| m.best_track.as_ref().map_or(f64::NAN, |t| t.dz(&Point3::ORIGIN)),
        },
    ];
}

impl Selectable for Met {
    const KIND: &'static str = "MET";

    const FIELDS: &'static [Field<Met>] = &[
        Field { name: "pt", get: |m| m.pt },
        Field { name: "et", get: |m| m.pt },
        Field { name: "phi", get: |m| m.phi },
        Field { name: "px", get: |m| m.pt * m.phi.cos() },
        Field { name: "py", get: |m| m.pt * m.phi.sin() },
        Field { name: "sumEt", get: |m| m.sum_et },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqm_core::Track;

    #[test]
    fn muon_table_lookup() {
        let mut m = Muon::new(20.0, 0.0, 0.0);
        m.is_global_muon = true;
        m.charge = -1;
        assert_eq!((Muon::field("pt").unwrap())(&m), 20.0);
        assert_eq!((Muon::field("isGlobalMuon").unwrap())(&m), 1.0);
        assert_eq!((Muon::field("isPFMuon").unwrap())(&m), 0.0);
        assert_eq!((Muon::field("charge").unwrap())(&m), -1.0);
        assert!(Muon::field("sumEt").is_none());
    }

    #[test]
    fn muon_impact_fields_need_a_track() {
        let m = Muon::new(20.0, 0.0, 0.0);
        assert!((Muon::field("dxy").unwrap())(&m).is_nan());
        let m = m.with_track(Track::from_impact(20.0, 0.0, 0.0, 0.05, -0.3));
        assert!(((Muon::field("dxy").unwrap())(&m) - 0.05).abs() < 1e-12);
        assert!(((Muon::field("dz").unwrap())(&m) + 0.3).abs() < 1e-12);
    }

    #[test]
    fn met_table_lookup() {
        let met = Met { pt: 50.0, phi: 0.0, sum_et: 800.0 };
        assert_eq!((Met::field("px").unwrap())(&met), 50.0);
        assert_eq!((Met::field("sumEt").unwrap())(&met), 800.0);
        assert!(Met::field("eta").is_none());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Muon::FIELDS.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Muon::FIELDS.len());
    }
}
