use criterion::{criterion_group, criterion_main, Criterion};
use sharmonics::lowlevel::legendre;
use sharmonics::{reconstruct, Projector, Rotation3, SampleConfig, SampleSet, ShRotation, Spherical};
use std::hint::black_box;

fn sky(x: f64, y: f64, z: f64) -> f64 {
    let sun = (0.3 * x + 0.4 * y + 0.866 * z).max(0.0);
    0.2 + z.max(0.0) + 4.0 * sun.powi(16)
}

fn bench_basis(c: &mut Criterion) {
    c.bench_function("legendre_l8_m3", |b| {
        b.iter(|| black_box(legendre(black_box(8), black_box(3), black_box(0.37)).unwrap()));
    });
}

fn bench_sampling(c: &mut Criterion) {
    let cfg = SampleConfig {
        num_samples: 10_000,
        num_bands: 4,
        ..SampleConfig::default()
    };
    c.bench_function("generate_10k_4_bands", |b| {
        b.iter(|| black_box(SampleSet::generate::<Spherical>(&cfg).unwrap()));
    });
}

fn bench_projection(c: &mut Criterion) {
    let set = SampleSet::generate::<Spherical>(&SampleConfig {
        num_samples: 10_000,
        num_bands: 4,
        ..SampleConfig::default()
    })
    .unwrap();
    let projector = Projector::new(&set);
    c.bench_function("project_10k_4_bands", |b| {
        b.iter(|| black_box(projector.project_cartesian(sky).unwrap()));
    });

    let coeffs = projector.project_cartesian(sky).unwrap();
    c.bench_function("reconstruct_4_bands", |b| {
        b.iter(|| {
            let value = reconstruct::<Spherical, f64>(black_box(0.8), black_box(2.1), &coeffs);
            black_box(value.unwrap())
        });
    });
}

fn bench_rotation(c: &mut Criterion) {
    let rot = Rotation3::from_axis_angle([0.2, -0.7, 0.4], 1.3).unwrap();
    c.bench_function("build_rotation_8_bands", |b| {
        b.iter(|| black_box(ShRotation::new(&rot, 8).unwrap()));
    });

    let sh = ShRotation::new(&rot, 8).unwrap();
    let coeffs: Vec<f64> = (0..64).map(|i| (i as f64 * 0.21).cos()).collect();
    c.bench_function("apply_rotation_8_bands", |b| {
        b.iter(|| black_box(sh.apply(&coeffs).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_basis,
    bench_sampling,
    bench_projection,
    bench_rotation
);
criterion_main!(benches);
