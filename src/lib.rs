pub mod config;
pub mod error;
pub mod lj_pot;
pub mod metropolis;
pub mod rng;
pub mod sink;
pub mod system;

pub use config::McConfig;
pub use error::{McError, Result};
pub use lj_pot::LennardJonesGravity;
pub use metropolis::{KickRange, MoveOutcome, SweepStatistics};
pub use rng::{RandomSource, ScriptedSource};
pub use system::{Cylinder, ParticleSystem, Placement};
