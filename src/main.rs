use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gassim2d::core::SampleClock;
use gassim2d::error::Result;
use gassim2d::{SimulationWorld, WorldConfig};

/// Headless gas chamber: runs the tick loop and logs pressure once per simulated second.
#[derive(Debug, Parser)]
#[command(name = "gassim2d", version, about)]
struct Args {
    /// JSON world configuration; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Particle count (clamped to the configured range).
    #[arg(long)]
    particles: Option<f64>,

    /// Temperature in degrees Celsius.
    #[arg(long, allow_hyphen_values = true)]
    temperature: Option<f64>,

    /// Compressor height.
    #[arg(long)]
    boundary: Option<f64>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Ticks per simulated second.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final snapshot as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => WorldConfig::from_json_file(path)?,
        None => WorldConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut world = SimulationWorld::new(config)?;
    world.configure(
        args.particles.unwrap_or(world.particle_count() as f64),
        args.temperature.unwrap_or(world.temperature_celsius()),
        args.boundary.unwrap_or(world.boundary_top()),
    )?;

    // Round the frame up so `fps` frames never fall short of one second.
    let frame = Duration::from_nanos(1_000_000_000u64.div_ceil(u64::from(args.fps.max(1))));
    let mut clock = SampleClock::new(Duration::from_secs(1))?;
    info!(
        particles = world.particle_count(),
        kelvin = world.temperature_kelvin(),
        boundary_top = world.boundary_top(),
        speed_threshold = world.speed_threshold(),
        normalization = ?world.normalization(),
        sample_period_s = clock.period().as_secs_f64(),
        "chamber ready"
    );

    for _ in 0..args.ticks {
        world.step();
        if let Some(window) = clock.advance(frame) {
            let pressure = world.sample(window)?;
            info!(tick = world.ticks(), pressure, "pressure");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&world.snapshot())?);
    }
    Ok(())
}
