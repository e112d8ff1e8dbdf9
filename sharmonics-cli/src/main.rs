use clap::Parser;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sharmonics::{
    reconstruct_kind, BasisKind, MatrixLayout, ProjectConfig, Projector, Rgb, Rotation3,
    RotationConfig, SampleConfig, SampleSet, ShRotation, ShValue,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Spherical harmonics CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BasisConfig {
    #[default]
    Spherical,
    Zonal,
    Hemispherical,
}

impl From<BasisConfig> for BasisKind {
    fn from(value: BasisConfig) -> Self {
        match value {
            BasisConfig::Spherical => BasisKind::Spherical,
            BasisConfig::Zonal => BasisKind::Zonal,
            BasisConfig::Hemispherical => BasisKind::Hemispherical,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutConfig {
    #[default]
    RowMajor,
    ColumnMajor,
}

impl From<LayoutConfig> for MatrixLayout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::RowMajor => MatrixLayout::RowMajor,
            LayoutConfig::ColumnMajor => MatrixLayout::ColumnMajor,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SampleConfigJson {
    num_samples: usize,
    num_bands: usize,
    seed: u64,
    parallel: bool,
}

impl Default for SampleConfigJson {
    fn default() -> Self {
        let cfg = SampleConfig::default();
        Self {
            num_samples: cfg.num_samples,
            num_bands: cfg.num_bands,
            seed: cfg.seed,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PolynomialTerm {
    coeff: f64,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default)]
    z: i32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum IntegrandConfig {
    /// `value` everywhere.
    Constant { value: f64 },
    /// `max(0, d . axis)^exponent`.
    CosineLobe { axis: [f64; 3], exponent: i32 },
    /// Sum of `coeff * x^a * y^b * z^c`.
    Polynomial { terms: Vec<PolynomialTerm> },
    /// Sky gradient plus a sun lobe, in RGB.
    RgbSky {
        sun_direction: [f64; 3],
        sun_color: [f64; 3],
        zenith_color: [f64; 3],
        horizon_color: [f64; 3],
        sharpness: i32,
    },
}

impl Default for IntegrandConfig {
    fn default() -> Self {
        IntegrandConfig::Constant { value: 1.0 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RotationJson {
    AxisAngle {
        axis: [f64; 3],
        angle_deg: f64,
    },
    Matrix {
        matrix: [[f64; 3]; 3],
        #[serde(default)]
        layout: LayoutConfig,
    },
}

impl RotationJson {
    fn build(self) -> Result<Rotation3, sharmonics::ShError> {
        match self {
            RotationJson::AxisAngle { axis, angle_deg } => {
                Rotation3::from_axis_angle(axis, angle_deg.to_radians())
            }
            RotationJson::Matrix { matrix, layout } => Rotation3::new(matrix, layout.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    basis: BasisConfig,
    samples: SampleConfigJson,
    integrand: IntegrandConfig,
    rotation: Option<RotationJson>,
    /// `[theta, phi]` pairs in radians.
    directions: Vec<[f64; 2]>,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            basis: BasisConfig::default(),
            samples: SampleConfigJson::default(),
            integrand: IntegrandConfig::default(),
            rotation: None,
            directions: Vec::new(),
            output_path: None,
        }
    }
}

/// JSON form of a coefficient or reconstructed value.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ValueRecord {
    Scalar(f64),
    Color([f64; 3]),
}

trait ToRecord {
    fn to_record(&self) -> ValueRecord;
}

impl ToRecord for f64 {
    fn to_record(&self) -> ValueRecord {
        ValueRecord::Scalar(*self)
    }
}

impl ToRecord for Rgb {
    fn to_record(&self) -> ValueRecord {
        ValueRecord::Color([self.r, self.g, self.b])
    }
}

#[derive(Debug, Serialize)]
struct ReconstructionRecord {
    theta: f64,
    phi: f64,
    value: ValueRecord,
}

#[derive(Debug, Serialize)]
struct Output {
    basis: &'static str,
    num_bands: usize,
    num_samples: usize,
    coefficients: Vec<ValueRecord>,
    rotated: Option<Vec<ValueRecord>>,
    reconstructed: Vec<ReconstructionRecord>,
}

fn normalized(v: [f64; 3]) -> Result<Vector3<f64>, Box<dyn std::error::Error>> {
    Vector3::from(v)
        .try_normalize(f64::MIN_POSITIVE)
        .ok_or_else(|| "direction vectors in the integrand must be non-zero".into())
}

fn lerp(a: [f64; 3], b: [f64; 3], t: f64) -> Rgb {
    Rgb::new(
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    )
}

/// Projects, optionally rotates and reconstructs one integrand.
fn run<V, F>(
    f: F,
    set: &SampleSet,
    config: &Config,
    rotation: Option<&ShRotation>,
) -> Result<Output, Box<dyn std::error::Error>>
where
    V: ShValue + ToRecord,
    F: Fn(f64, f64, f64) -> V + Sync,
{
    let kind = set.basis();
    let projector = Projector::new(set).with_config(ProjectConfig {
        parallel: config.samples.parallel,
    });
    let coeffs = projector.project_cartesian(f)?;
    let rotated = rotation.map(|r| r.apply(&coeffs)).transpose()?;
    let evaluated = rotated.as_deref().unwrap_or(&coeffs);

    let mut reconstructed = Vec::with_capacity(config.directions.len());
    for &[theta, phi] in &config.directions {
        let value = reconstruct_kind(kind, theta, phi, evaluated)?;
        reconstructed.push(ReconstructionRecord {
            theta,
            phi,
            value: value.to_record(),
        });
    }

    Ok(Output {
        basis: kind.name(),
        num_bands: set.num_bands(),
        num_samples: set.len(),
        coefficients: coeffs.iter().map(ToRecord::to_record).collect(),
        rotated: rotated.map(|r| r.iter().map(ToRecord::to_record).collect()),
        reconstructed,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("sharmonics=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let mut config: Config = serde_json::from_str(&config_text)?;
    if config.samples.num_samples == 0 {
        return Err("samples.num_samples must be at least 1".into());
    }

    let kind: BasisKind = std::mem::take(&mut config.basis).into();
    let set = SampleSet::generate_kind(
        kind,
        &SampleConfig {
            num_samples: config.samples.num_samples,
            num_bands: config.samples.num_bands,
            seed: config.samples.seed,
            parallel: config.samples.parallel,
        },
    )?;

    let rotation = match config.rotation.take() {
        Some(rot) => Some(ShRotation::with_config(
            &rot.build()?,
            config.samples.num_bands,
            &RotationConfig {
                parallel: config.samples.parallel,
            },
        )?),
        None => None,
    };
    let rotation = rotation.as_ref();

    let output = match std::mem::take(&mut config.integrand) {
        IntegrandConfig::Constant { value } => run(|_, _, _| value, &set, &config, rotation)?,
        IntegrandConfig::CosineLobe { axis, exponent } => {
            let n = normalized(axis)?;
            let lobe = move |x: f64, y: f64, z: f64| {
                Vector3::new(x, y, z).dot(&n).max(0.0).powi(exponent)
            };
            run(lobe, &set, &config, rotation)?
        }
        IntegrandConfig::Polynomial { terms } => {
            let poly = move |x: f64, y: f64, z: f64| {
                terms
                    .iter()
                    .map(|t| t.coeff * x.powi(t.x) * y.powi(t.y) * z.powi(t.z))
                    .sum::<f64>()
            };
            run(poly, &set, &config, rotation)?
        }
        IntegrandConfig::RgbSky {
            sun_direction,
            sun_color,
            zenith_color,
            horizon_color,
            sharpness,
        } => {
            let sun = normalized(sun_direction)?;
            let sky = move |x: f64, y: f64, z: f64| {
                let gradient = lerp(horizon_color, zenith_color, z.max(0.0));
                let lobe = Vector3::new(x, y, z).dot(&sun).max(0.0).powi(sharpness);
                gradient + Rgb::new(sun_color[0], sun_color[1], sun_color[2]) * lobe
            };
            run(sky, &set, &config, rotation)?
        }
    };

    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
