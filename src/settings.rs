use anyhow::Result;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;

use crate::fresnel::Polarization;
use crate::source::Spectrum;

/// Reference wavelength for the dispersion correction, in nm.
pub const LAMBDA_0: f32 = 400.0;
/// Upper edge of the modeled visible band, in nm.
pub const LAMBDA_F: f32 = 680.0;
/// Half-width of the visible domain. Particles outside `[-DOMAIN, DOMAIN]`
/// in either coordinate are reclaimed.
pub const DOMAIN: f32 = 1.0;
/// Upper boundary of the interior layer span.
pub const STACK_TOP: f32 = 0.0;
/// Lower boundary of the interior layer span.
pub const STACK_BOTTOM: f32 = -0.96;
/// Maximum magnitude of the source arc x position. Emission exactly at the
/// arc endpoints is degenerate, so positions are clamped inside this.
pub const SOURCE_CLAMP: f32 = 0.999;

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Nominal refractive indices of the interior layers, top to bottom.
    pub indices: Vec<f32>,
    /// Dispersion coefficient dn/dlambda, per nm. Zero disables dispersion.
    pub dispersion: f32,
    /// Emission speed in domain units per tick.
    pub speed: f32,
    /// Source position along the unit arc, as the x coordinate.
    pub source_x: f32,
    /// Wavelength selection at spawn.
    pub spectrum: Spectrum,
    /// Fixed polarization for all particles. If unset, spawns alternate
    /// between parallel and perpendicular.
    pub polarization: Option<Polarization>,
    /// Bounce counts at or above this fall into the overflow bucket.
    pub bucket_ceiling: u32,
    /// Exited particles are folded into the histogram every this many ticks.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Number of particles traced by the batch runner.
    pub num_particles: usize,
    /// Safety cap on ticks per particle in the batch runner.
    #[serde(default = "default_max_ticks")]
    pub max_ticks_per_particle: u64,
    /// Random seed for the simulation.
    pub seed: Option<u64>,
}

fn default_cleanup_interval() -> u64 {
    20
}

fn default_max_ticks() -> u64 {
    10_000
}

pub fn load_default_config() -> Result<Settings> {
    let refrax_dir = retrieve_project_root();
    let default_config_file = refrax_dir.join("config/default.toml");

    let settings: Config = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    validate_config(&config)?;

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    // Try to find the project directory in different ways
    let refrax_dir = retrieve_project_root();

    let default_config_file = refrax_dir.join("config/default.toml");
    let local_config = refrax_dir.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        println!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        println!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings: Config = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("refrax"))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let mut config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    // Parse command-line arguments and override values
    let args = CliArgs::parse();

    if let Some(indices) = args.indices {
        config.indices = indices;
    }
    if let Some(dispersion) = args.dispersion {
        config.dispersion = dispersion;
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(source_x) = args.source_x {
        config.source_x = source_x;
    }
    if let Some(wavelength) = args.w {
        config.spectrum = Spectrum::Monochromatic { wavelength };
    }
    if args.broadband {
        config.spectrum = Spectrum::Broadband;
    }
    if let Some(polarization) = args.polarization {
        config.polarization = Some(polarization);
    }
    if let Some(buckets) = args.buckets {
        config.bucket_ceiling = buckets;
    }
    if let Some(num_particles) = args.particles {
        config.num_particles = num_particles;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    validate_config(&config)?;

    println!("{:#?}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the REFRAX_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
/// If none of these methods work, the function will panic.
fn retrieve_project_root() -> std::path::PathBuf {
    let refrax_dir = if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        std::path::PathBuf::from(manifest_dir)
    } else if let Ok(path) = env::var("REFRAX_ROOT_DIR") {
        // Allow explicit configuration via environment variable
        std::path::PathBuf::from(path)
    } else {
        // Fallback: try to find the nearest directory containing a "config" subdirectory
        // Start from the executable directory and walk upward
        let exe_path = env::current_exe().expect("Failed to get current executable path");
        let mut current_dir = exe_path
            .parent()
            .expect("Failed to get executable directory")
            .to_path_buf();
        let mut found = false;

        while !found && current_dir.parent().is_some() {
            if current_dir.join("config").is_dir() {
                found = true;
            } else {
                current_dir = current_dir.parent().unwrap().to_path_buf();
            }
        }

        if found {
            current_dir
        } else {
            panic!("Could not find project root directory");
        }
    };
    refrax_dir
}

/// Rejects configurations that are optically undefined before any stack or
/// particle is touched.
pub fn validate_config(config: &Settings) -> Result<()> {
    if config.indices.is_empty() {
        anyhow::bail!("At least one refractive index is required");
    }
    if let Some(n) = config.indices.iter().find(|n| **n <= 0.0) {
        anyhow::bail!("Refractive index must be positive, got {}", n);
    }
    if config.speed <= 0.0 {
        anyhow::bail!("Emission speed must be positive, got {}", config.speed);
    }
    if config.bucket_ceiling == 0 {
        anyhow::bail!("Bucket ceiling must be at least 1");
    }
    if let Spectrum::Monochromatic { wavelength } = config.spectrum {
        if wavelength <= 0.0 {
            anyhow::bail!("Wavelength must be positive, got {}", wavelength);
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "refrax - Monte Carlo refraction through a planar dielectric stack"
)]
pub struct CliArgs {
    /// Nominal refractive indices of the interior layers, top to bottom,
    /// separated by spaces.
    #[arg(short, long, value_parser, num_args = 1.., value_delimiter = ' ')]
    indices: Option<Vec<f32>>,

    /// Dispersion coefficient dn/dlambda in units of 1/nm.
    #[arg(short, long)]
    dispersion: Option<f32>,

    /// Emission speed in domain units per tick.
    #[arg(long)]
    speed: Option<f32>,

    /// Source position along the unit arc, given as the x coordinate.
    /// The emission angle follows as acos(x).
    #[arg(short = 'x', long)]
    source_x: Option<f32>,

    /// Emission wavelength in nm. Selects a monochromatic spectrum.
    #[arg(short, long, group = "spectrum")]
    w: Option<f32>,

    /// Sample each particle's wavelength uniformly over the visible band.
    #[arg(long, group = "spectrum")]
    broadband: bool,

    /// Polarization of emitted particles: "parallel" or "perpendicular".
    /// If omitted, spawns alternate between the two.
    #[arg(short, long, value_parser = parse_polarization)]
    polarization: Option<Polarization>,

    /// Bounce-count ceiling for the histogram overflow bucket.
    #[arg(short, long)]
    buckets: Option<u32>,

    /// Number of particles traced by the batch runner.
    #[arg(short = 'n', long)]
    particles: Option<usize>,

    /// Random seed for the simulation.
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Parse a polarization selector from its name
fn parse_polarization(s: &str) -> Result<Polarization, String> {
    match s.to_lowercase().as_str() {
        "parallel" | "p" => Ok(Polarization::Parallel),
        "perpendicular" | "s" => Ok(Polarization::Perpendicular),
        other => Err(format!(
            "Invalid polarization: '{}'. Expected 'parallel' or 'perpendicular'",
            other
        )),
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Layer Indices: {:?}
  - Dispersion: {:.6} /nm
  - Speed: {:.4}
  - Source X: {:.4}
  - Spectrum: {:?}
  - Bucket Ceiling: {}
  - Particles: {}
  ",
            self.indices,
            self.dispersion,
            self.speed,
            self.source_x,
            self.spectrum,
            self.bucket_ceiling,
            self.num_particles,
        )
    }
}
