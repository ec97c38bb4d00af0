//! Cylinder Monte Carlo command-line interface
//!
//! Reads a YAML configuration, runs the Metropolis sweeps and streams the
//! trajectory and energy series to text files.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use mc_sampling::McConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

mod args;
mod output;

use args::Args;
use output::setup_output;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.output.as_ref(), args.verbose);

    info!("Reading configuration from: {}", args.config_file);
    let mut config = McConfig::from_file(&args.config_file)
        .wrap_err_with(|| format!("Unable to load configuration file: {}", args.config_file))?;

    apply_overrides(&mut config, &args);
    config
        .validate()
        .wrap_err("Invalid configuration after command-line overrides")?;

    info!("Configuration loaded:\n{:?}", config);

    run(&config)
}

/// Override configuration values with command-line arguments
fn apply_overrides(config: &mut McConfig, args: &Args) {
    if let Some(steps) = args.steps {
        info!("Overriding steps with: {}", steps);
        config.sampling.steps = steps;
    }
    if let Some(dr) = args.max_displacement {
        info!("Overriding max_displacement with: {}", dr);
        config.sampling.max_displacement = dr;
    }
    if let Some(t) = args.temperature {
        info!("Overriding temperature with: {}", t);
        config.system.temperature = t;
    }
    if let Some(r) = args.radius {
        info!("Overriding radius with: {}", r);
        config.system.radius = r;
    }
    if let Some(seed) = args.seed {
        info!("Overriding seed with: {}", seed);
        config.system.seed = Some(seed);
    }
    if let Some(path) = &args.positions {
        config.output.positions = path.clone();
    }
    if let Some(path) = &args.energies {
        config.output.energies = path.clone();
    }
    if args.no_energy {
        config.sampling.report_energy = false;
    }
}

fn run(config: &McConfig) -> Result<()> {
    let mut system = config
        .build_system()
        .wrap_err("Failed to initialize the particle system")?;
    let initial_energy = system.energy();

    let mut positions = create_sink(&config.output.positions)?;
    let mut energies = create_sink(&config.output.energies)?;

    system
        .evolve(
            config.sampling.steps,
            config.sampling.max_displacement,
            &mut positions,
            &mut energies,
            config.sampling.report_energy,
        )
        .wrap_err("Sampling aborted")?;

    if config.output.final_snapshot {
        system
            .write_positions(&mut positions)
            .wrap_err("Failed to write final snapshot")?;
    }

    positions
        .flush()
        .wrap_err_with(|| format!("Failed to flush {}", config.output.positions))?;
    energies
        .flush()
        .wrap_err_with(|| format!("Failed to flush {}", config.output.energies))?;

    info!("Initial energy: {:.6}", initial_energy);
    info!("Final energy:   {:.6}", system.energy());
    system.stats().log_summary();
    info!("Positions written to: {}", config.output.positions);
    if config.sampling.report_energy {
        info!("Energies written to:  {}", config.output.energies);
    }

    Ok(())
}

fn create_sink(path: &str) -> Result<BufWriter<File>> {
    let file = File::create(path).wrap_err_with(|| format!("Unable to create {}", path))?;
    Ok(BufWriter::new(file))
}
