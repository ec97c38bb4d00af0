use nalgebra::Vector3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{McError, Result};
use crate::metropolis::KickRange;
use crate::rng::{entropy_source, seeded_source};
use crate::system::{ParticleSystem, Placement, DEFAULT_CUTOFF};

/// Configuration for a cylinder Monte Carlo run
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct McConfig {
    /// Particles, geometry and interaction parameters
    pub system: SystemConfig,
    /// Sweep count and trial move settings
    pub sampling: SamplingConfig,
    /// Trajectory and energy output files
    #[serde(default)]
    pub output: OutputConfig,
}

/// System setup configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Number of particles
    pub n_particles: usize,
    /// Gravitational coefficient
    pub gamma: f64,
    /// Cylinder radius
    pub radius: f64,
    /// Temperature in reduced units (k_B = 1)
    pub temperature: f64,
    /// Lennard-Jones cutoff distance (default: 2.5σ)
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    /// Initial placement of the particles
    #[serde(default)]
    pub placement: PlacementConfig,
    /// Optional random seed
    pub seed: Option<u64>,
}

/// Initial placement options
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum PlacementConfig {
    /// Random positions inside the cylinder
    #[serde(rename = "random")]
    Random {
        #[serde(default)]
        distribution: Placement,
    },
    /// Explicit list of positions
    #[serde(rename = "explicit")]
    Explicit { coords: Vec<[f64; 3]> },
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig::Random {
            distribution: Placement::default(),
        }
    }
}

/// Sampling configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SamplingConfig {
    /// Number of sweeps
    pub steps: usize,
    /// Maximum single-axis trial displacement
    pub max_displacement: f64,
    /// Trial displacement law
    #[serde(default)]
    pub kick_range: KickRange,
    /// Whether to append the energy after every sweep
    #[serde(default = "default_report_energy")]
    pub report_energy: bool,
}

/// Output configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Position snapshot file
    #[serde(default = "default_positions_path")]
    pub positions: String,
    /// Energy series file
    #[serde(default = "default_energies_path")]
    pub energies: String,
    /// Whether to append a snapshot of the final configuration
    #[serde(default)]
    pub final_snapshot: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            positions: default_positions_path(),
            energies: default_energies_path(),
            final_snapshot: false,
        }
    }
}

// Default value functions
fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}
fn default_report_energy() -> bool {
    true
}
fn default_positions_path() -> String {
    "positions.dat".to_string()
}
fn default_energies_path() -> String {
    "energies.dat".to_string()
}

impl McConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: McConfig = serde_yml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let system = &self.system;
        if system.n_particles == 0 {
            return Err(McError::invalid("Number of particles must be positive"));
        }
        if !system.gamma.is_finite() {
            return Err(McError::invalid("Gamma must be finite"));
        }
        if !(system.radius.is_finite() && system.radius > 0.0) {
            return Err(McError::invalid("Cylinder radius must be positive"));
        }
        if !(system.temperature.is_finite() && system.temperature > 0.0) {
            return Err(McError::invalid("Temperature must be positive"));
        }
        if !(system.cutoff.is_finite() && system.cutoff > 0.0) {
            return Err(McError::invalid("Cutoff must be positive"));
        }

        if let PlacementConfig::Explicit { coords } = &system.placement {
            if coords.len() != system.n_particles {
                return Err(McError::invalid(format!(
                    "Number of explicit positions ({}) doesn't match number of particles ({})",
                    coords.len(),
                    system.n_particles
                )));
            }
        }

        let max_disp = self.sampling.max_displacement;
        if !(max_disp.is_finite() && max_disp >= 0.0) {
            return Err(McError::invalid("Maximum displacement must be non-negative"));
        }

        Ok(())
    }

    /// Build and initialize the particle system this configuration describes
    pub fn build_system(&self) -> Result<ParticleSystem<StdRng>> {
        let system = &self.system;
        let rng = match system.seed {
            Some(seed) => seeded_source(seed),
            None => entropy_source(),
        };

        let mut particles = ParticleSystem::with_rng(system.n_particles, system.gamma, rng)?
            .with_cutoff(system.cutoff)?
            .with_kick_range(self.sampling.kick_range);

        match &system.placement {
            PlacementConfig::Random { distribution } => {
                particles = particles.with_placement(*distribution);
                particles.init_config(system.radius, system.temperature)?;
            }
            PlacementConfig::Explicit { coords } => {
                let positions = coords
                    .iter()
                    .map(|&c| Vector3::new(c[0], c[1], c[2]))
                    .collect();
                particles.init_explicit(positions, system.radius, system.temperature)?;
            }
        }

        particles.set_max_displacement(self.sampling.max_displacement)?;
        Ok(particles)
    }
}
