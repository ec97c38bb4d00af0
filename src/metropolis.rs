// file: `src/metropolis.rs`
//! Metropolis single-particle sweeps.
//!
//! Each trial recomputes the full O(N²) potential twice, so one sweep costs
//! O(N³).

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{McError, Result};
use crate::rng::RandomSource;
use crate::system::{Cylinder, ParticleSystem};

/// Per-axis trial displacement law, with `d` uniform on `[0, dr]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KickRange {
    /// `2d - 1`, spanning `[-1, 2dr - 1]`
    #[default]
    Shifted,
    /// `2d - dr`, spanning `[-dr, dr]`
    Symmetric,
}

impl KickRange {
    fn perturbation(self, d: f64, dr: f64) -> f64 {
        match self {
            KickRange::Shifted => 2.0 * d - 1.0,
            KickRange::Symmetric => 2.0 * d - dr,
        }
    }
}

/// How a single trial move ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted,
    /// The trial left the cylinder; no acceptance test was made
    RejectedConfinement,
    /// The Boltzmann test failed
    RejectedBoltzmann,
}

/// Cumulative trial-move counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStatistics {
    pub attempts: u64,
    pub accepted: u64,
    pub confinement_rejections: u64,
    pub boltzmann_rejections: u64,
}

impl SweepStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: MoveOutcome) {
        self.attempts += 1;
        match outcome {
            MoveOutcome::Accepted => self.accepted += 1,
            MoveOutcome::RejectedConfinement => self.confinement_rejections += 1,
            MoveOutcome::RejectedBoltzmann => self.boltzmann_rejections += 1,
        }
    }

    fn rate(&self, count: u64) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            count as f64 / self.attempts as f64
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        self.rate(self.accepted)
    }

    pub fn confinement_rejection_rate(&self) -> f64 {
        self.rate(self.confinement_rejections)
    }

    pub fn boltzmann_rejection_rate(&self) -> f64 {
        self.rate(self.boltzmann_rejections)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        info!("=== Sweep Statistics ===");
        info!(
            "Accepted:               {} / {} ({:.2}%)",
            self.accepted,
            self.attempts,
            100.0 * self.acceptance_rate()
        );
        info!(
            "Rejected (confinement): {} ({:.2}%)",
            self.confinement_rejections,
            100.0 * self.confinement_rejection_rate()
        );
        info!(
            "Rejected (Boltzmann):   {} ({:.2}%)",
            self.boltzmann_rejections,
            100.0 * self.boltzmann_rejection_rate()
        );
    }
}

impl<R: RandomSource> ParticleSystem<R> {
    /// Set the maximum per-axis displacement `dr` used by trial moves
    pub fn set_max_displacement(&mut self, max_disp: f64) -> Result<()> {
        if !(max_disp.is_finite() && max_disp >= 0.0) {
            return Err(McError::invalid(format!(
                "maximum displacement must be a non-negative number, got {}",
                max_disp
            )));
        }
        self.max_displacement = max_disp;
        Ok(())
    }

    fn cylinder(&self) -> Result<Cylinder> {
        self.cylinder
            .ok_or_else(|| McError::invalid("system must be initialized before sampling"))
    }

    /// Attempt one trial move for every particle, in index order, then
    /// refresh the cached energy.
    pub fn sweep(&mut self) -> Result<()> {
        self.cylinder()?;
        for i in 0..self.positions.len() {
            let outcome = self.attempt_move(i)?;
            self.stats.record(outcome);
        }

        self.energy = self.potential.checked_energy(&self.positions)?;
        self.sweeps += 1;
        debug!(
            "Sweep {}: U = {:.6}, acceptance = {:.4}",
            self.sweeps,
            self.energy,
            self.stats.acceptance_rate()
        );
        Ok(())
    }

    /// Propose, test and commit or revert a trial move of particle `i`.
    ///
    /// On a non-finite energy the particle is put back before the error is
    /// returned.
    pub fn attempt_move(&mut self, i: usize) -> Result<MoveOutcome> {
        let cylinder = self.cylinder()?;
        if i >= self.positions.len() {
            return Err(McError::invalid(format!(
                "particle index {} out of range for {} particles",
                i,
                self.positions.len()
            )));
        }

        let u_before = self.potential.total_energy(&self.positions);
        if !u_before.is_finite() {
            warn!("Non-finite energy before moving particle {}", i);
            return Err(McError::NumericDegeneracy {
                energy: u_before,
                context: format!("before moving particle {}", i),
            });
        }
        let saved = self.positions[i];

        if !self.kick(i, &cylinder) {
            self.positions[i] = saved;
            return Ok(MoveOutcome::RejectedConfinement);
        }

        let u_after = self.potential.total_energy(&self.positions);
        if !u_after.is_finite() {
            self.positions[i] = saved;
            warn!("Non-finite energy after moving particle {}", i);
            return Err(McError::NumericDegeneracy {
                energy: u_after,
                context: format!("after moving particle {}", i),
            });
        }

        let delta_u = u_after - u_before;
        if delta_u <= 0.0 {
            return Ok(MoveOutcome::Accepted);
        }

        let p = self.rng.uniform(0.0, 1.0);
        if p <= (-delta_u / self.temperature).exp() {
            Ok(MoveOutcome::Accepted)
        } else {
            self.positions[i] = saved;
            Ok(MoveOutcome::RejectedBoltzmann)
        }
    }

    /// Displace particle `i` along each axis; returns whether it is still
    /// inside the cylinder. The caller restores the position on failure.
    fn kick(&mut self, i: usize, cylinder: &Cylinder) -> bool {
        let dr = self.max_displacement;
        for k in 0..3 {
            let d = self.rng.uniform(0.0, dr);
            self.positions[i][k] += self.kick_range.perturbation(d, dr);
        }
        cylinder.contains(&self.positions[i])
    }
}
