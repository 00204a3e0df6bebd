use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dqm_core::Muon;
use dqm_expr::Selector;
use std::hint::black_box;

fn make_muons(n: usize) -> Vec<Muon> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            let mut m = Muon::new(2.0 + (x * 7.3) % 80.0, ((x * 0.37) % 5.0) - 2.5, (x * 0.11) % 3.1);
            m.is_global_muon = i % 3 != 0;
            m
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_filter");
    let cuts = [
        ("simple", "pt > 6 && eta < 2.4"),
        ("functions", "pt > 20 && abs(eta) < 2.1 && isGlobalMuon && sqrt(px*px + py*py) > 15"),
    ];

    for n in [16usize, 256, 4096] {
        let muons = make_muons(n);
        for (label, cut) in cuts {
            let sel = Selector::<Muon>::compile(cut).unwrap();
            group.bench_with_input(BenchmarkId::new(label, n), &muons, |b, ms| {
                b.iter(|| black_box(sel.filter(ms).len()))
            });
        }
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("selector_compile", |b| {
        b.iter(|| Selector::<Muon>::compile(black_box("pt() > 6 and abs(eta()) < 2.4 or isPFMuon")))
    });
}

criterion_group!(benches, bench_filter, bench_compile);
criterion_main!(benches);
