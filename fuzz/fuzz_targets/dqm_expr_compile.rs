#![no_main]

use dqm_core::{Met, Muon, Track};
use dqm_expr::Selector;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    // Keep iterations fast.
    if src.len() > 4096 {
        return;
    }

    let muon = Muon::new(35.0, 0.4, 1.0).with_track(Track::from_impact(35.0, 0.4, 1.0, 0.01, 0.02));
    if let Ok(sel) = Selector::<Muon>::compile(src) {
        let _ = sel.accept(&muon);
        let _ = sel.filter(std::slice::from_ref(&muon));
    }
    if let Ok(sel) = Selector::<Met>::compile(src) {
        let _ = sel.accept(&Met::new(f64::NAN, 0.0));
    }
});
