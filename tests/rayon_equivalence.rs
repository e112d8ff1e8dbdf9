#![cfg(feature = "rayon")]

use sharmonics::{
    Hemispherical, ProjectConfig, Projector, Rgb, Rotation3, RotationConfig, SampleConfig,
    SampleSet, ShRotation, Spherical,
};

fn config(parallel: bool) -> SampleConfig {
    SampleConfig {
        num_samples: 5_000,
        num_bands: 5,
        seed: 314,
        parallel,
    }
}

#[test]
fn parallel_sampling_matches_sequential() {
    let seq = SampleSet::generate::<Spherical>(&config(false)).unwrap();
    let par = SampleSet::generate::<Spherical>(&config(true)).unwrap();
    assert_eq!(seq.directions(), par.directions());
    assert_eq!(seq.values(), par.values());

    let seq = SampleSet::generate::<Hemispherical>(&config(false)).unwrap();
    let par = SampleSet::generate::<Hemispherical>(&config(true)).unwrap();
    assert_eq!(seq.values(), par.values());
}

#[test]
fn parallel_projection_is_bit_identical() {
    let set = SampleSet::generate::<Spherical>(&config(false)).unwrap();
    let f = |x: f64, y: f64, z: f64| (3.0 * x - y).exp() * (1.0 + z);
    let seq = Projector::new(&set).project_cartesian(f).unwrap();
    let par = Projector::new(&set)
        .with_config(ProjectConfig { parallel: true })
        .project_cartesian(f)
        .unwrap();
    assert_eq!(seq, par);

    let color = |theta: f64, phi: f64| Rgb::new(theta.cos().max(0.0), phi.sin(), 0.5);
    let seq = Projector::new(&set).project_spherical(color).unwrap();
    let par = Projector::new(&set)
        .with_config(ProjectConfig { parallel: true })
        .project_spherical(color)
        .unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_rotation_matches_sequential() {
    let rot = Rotation3::from_axis_angle([0.3, -0.8, 0.5], 2.2).unwrap();
    let seq = ShRotation::new(&rot, 8).unwrap();
    let par = ShRotation::with_config(&rot, 8, &RotationConfig { parallel: true }).unwrap();
    assert_eq!(seq.to_dense(), par.to_dense());
}
