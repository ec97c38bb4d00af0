// file: `src/lj_pot.rs`
use itertools::Itertools;
use nalgebra::Vector3;

use crate::error::{McError, Result};

/// Truncated Lennard-Jones pair potential (ε = σ = 1) plus a linear
/// gravitational term along the cylinder axis.
#[derive(Debug, Clone, Copy)]
pub struct LennardJonesGravity {
    /// Gravitational coefficient multiplying each particle's height
    pub gamma: f64,
    /// Squared interaction cutoff
    pub r_cut2: f64,
}

impl LennardJonesGravity {
    pub fn new(gamma: f64, r_cut2: f64) -> Self {
        LennardJonesGravity { gamma, r_cut2 }
    }

    /// Build from a cutoff distance rather than its square
    pub fn with_cutoff(gamma: f64, r_cut: f64) -> Self {
        Self::new(gamma, r_cut * r_cut)
    }

    fn lj_potential(&self, r2: f64) -> f64 {
        let sr6 = 1.0 / (r2 * r2 * r2);
        4.0 * (sr6 * sr6 - sr6)
    }

    /// Total potential energy of a configuration.
    ///
    /// Every call is a full O(N²) recomputation. Coincident particles make the
    /// result non-finite; see [`checked_energy`](Self::checked_energy).
    pub fn total_energy(&self, positions: &[Vector3<f64>]) -> f64 {
        let gravity: f64 = positions.iter().map(|p| self.gamma * p.z).sum();

        let pairs: f64 = positions
            .iter()
            .tuple_combinations()
            .map(|(pi, pj)| (pi - pj).norm_squared())
            .filter(|&r2| r2 < self.r_cut2)
            .map(|r2| self.lj_potential(r2))
            .sum();

        gravity + pairs
    }

    /// Like [`total_energy`](Self::total_energy), but a non-finite result is an error
    pub fn checked_energy(&self, positions: &[Vector3<f64>]) -> Result<f64> {
        let energy = self.total_energy(positions);
        if energy.is_finite() {
            Ok(energy)
        } else {
            Err(McError::NumericDegeneracy {
                energy,
                context: format!("for a configuration of {} particles", positions.len()),
            })
        }
    }
}
