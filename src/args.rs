//! Command-line argument parsing for cylinder Monte Carlo runs

use clap::Parser;

/// Metropolis sampling of Lennard-Jones particles in a cylinder, configured from YAML
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "mc.yaml")]
    pub config_file: String,

    /// Override number of sweeps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Override maximum single-axis displacement
    #[arg(long)]
    pub max_displacement: Option<f64>,

    /// Override temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Override cylinder radius
    #[arg(long)]
    pub radius: Option<f64>,

    /// Override random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override position snapshot file
    #[arg(long)]
    pub positions: Option<String>,

    /// Override energy series file
    #[arg(long)]
    pub energies: Option<String>,

    /// Do not write per-sweep energies
    #[arg(long)]
    pub no_energy: bool,

    /// Override log output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Log every sweep
    #[arg(short, long)]
    pub verbose: bool,
}
