//! SimKit runner
//!
//! Runs a world for a number of ticks and writes the session export.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use simkit_core::config::DEFAULT_TUNING_PATH;
use simkit_core::{demo_world, Result, SimConfig, Simulator, World};

/// Command line arguments for the runner
#[derive(Parser, Debug)]
#[command(name = "simkit")]
#[command(about = "Deterministic tick-based social simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 20)]
    ticks: u64,

    /// World JSON to load instead of the demo compound
    #[arg(long)]
    world: Option<PathBuf>,

    /// TOML config file, defaults to ./simkit.toml when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the export
    #[arg(long, default_value = "output/export.json")]
    out: PathBuf,

    /// Scenario id recorded in the export
    #[arg(long, default_value = "demo")]
    scenario_id: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None if Path::new(DEFAULT_TUNING_PATH).exists() => {
            SimConfig::load_or_default(DEFAULT_TUNING_PATH)
        }
        None => SimConfig::default(),
    };

    let world = match &args.world {
        Some(path) => {
            let mut world = World::load(path)?;
            world.seed = args.seed;
            world
        }
        None => demo_world(args.seed)?,
    };

    tracing::info!(
        seed = args.seed,
        ticks = args.ticks,
        characters = world.characters.len(),
        locations = world.locations.len(),
        "starting simulation"
    );

    let mut sim = Simulator::new(world, config)?;
    for _ in 0..args.ticks {
        let record = sim.step()?;
        let decided_by = record.trace.notes.first().map(String::as_str).unwrap_or("");
        tracing::info!(
            tick = record.snapshot.tick_index,
            actions = record.trace.actions_applied.len(),
            events = record.snapshot.events.len(),
            decided_by,
            "tick"
        );
    }

    let export = sim.write_export(&args.scenario_id, &args.out)?;
    tracing::info!(
        path = %args.out.display(),
        records = export.records.len(),
        "wrote export"
    );

    Ok(())
}
