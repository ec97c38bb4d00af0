// file: `src/system.rs`
use std::f64::consts::PI;
use std::io::Write;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{McError, Result};
use crate::lj_pot::LennardJonesGravity;
use crate::metropolis::{KickRange, SweepStatistics};
use crate::rng::{entropy_source, RandomSource};
use crate::sink;

/// Default interaction cutoff, in units of σ
pub const DEFAULT_CUTOFF: f64 = 2.5;

/// Radial law used when scattering particles over the cylinder cross-section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// ρ uniform on `[0, R]`: particles crowd toward the axis
    #[default]
    RadialUniform,
    /// ρ = sqrt(u·R) with u uniform on `[0, R]`: uniform over the disc area
    AreaUniform,
}

/// Cylinder of radius `radius` standing on the plane z = 0, open at the top
#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    pub radius: f64,
}

impl Cylinder {
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        p.z >= 0.0 && p.x * p.x + p.y * p.y <= self.radius * self.radius
    }
}

/// N Lennard-Jones particles in a gravitational field, confined to a cylinder
/// and sampled in the canonical ensemble.
#[derive(Debug)]
pub struct ParticleSystem<R: RandomSource = StdRng> {
    pub(crate) positions: Vec<Vector3<f64>>,
    pub(crate) potential: LennardJonesGravity,
    /// `None` until one of the initializers has run
    pub(crate) cylinder: Option<Cylinder>,
    pub(crate) temperature: f64,
    pub(crate) max_displacement: f64,
    /// Energy of the last committed configuration
    pub(crate) energy: f64,
    pub(crate) rng: R,
    pub(crate) kick_range: KickRange,
    pub(crate) placement: Placement,
    pub(crate) stats: SweepStatistics,
    pub(crate) sweeps: u64,
}

impl ParticleSystem<StdRng> {
    /// Create a system of `n` particles with a random source seeded from the OS
    pub fn new(n: usize, gamma: f64) -> Result<Self> {
        Self::with_rng(n, gamma, entropy_source())
    }
}

impl<R: RandomSource> ParticleSystem<R> {
    /// Create a system of `n` particles drawing from `rng`
    ///
    /// # Arguments
    /// * `n` - Particle count, fixed for the lifetime of the system
    /// * `gamma` - Gravitational coefficient
    /// * `rng` - Random source owned by the system
    pub fn with_rng(n: usize, gamma: f64, rng: R) -> Result<Self> {
        if n == 0 {
            return Err(McError::invalid("particle count must be positive"));
        }
        if !gamma.is_finite() {
            return Err(McError::invalid("gamma must be finite"));
        }

        Ok(Self {
            positions: vec![Vector3::zeros(); n],
            potential: LennardJonesGravity::with_cutoff(gamma, DEFAULT_CUTOFF),
            cylinder: None,
            temperature: 0.0,
            max_displacement: 0.0,
            energy: 0.0,
            rng,
            kick_range: KickRange::default(),
            placement: Placement::default(),
            stats: SweepStatistics::new(),
            sweeps: 0,
        })
    }

    /// Set the interaction cutoff distance.
    ///
    /// On an initialized system the cached energy is recomputed with the new
    /// cutoff; if that energy is not finite the system is left unchanged.
    pub fn with_cutoff(mut self, r_cut: f64) -> Result<Self> {
        if !(r_cut.is_finite() && r_cut > 0.0) {
            return Err(McError::invalid(format!(
                "cutoff must be a positive number, got {}",
                r_cut
            )));
        }
        let potential = LennardJonesGravity {
            r_cut2: r_cut * r_cut,
            ..self.potential
        };
        if self.is_initialized() {
            self.energy = potential.checked_energy(&self.positions)?;
        }
        self.potential = potential;
        Ok(self)
    }

    /// Select the trial displacement law
    pub fn with_kick_range(mut self, kick_range: KickRange) -> Self {
        self.kick_range = kick_range;
        self
    }

    /// Select the radial law used by [`init_config`](Self::init_config)
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    fn check_conditions(radius: f64, temperature: f64) -> Result<Cylinder> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(McError::invalid(format!(
                "cylinder radius must be positive, got {}",
                radius
            )));
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(McError::invalid(format!(
                "temperature must be positive, got {}",
                temperature
            )));
        }
        Ok(Cylinder { radius })
    }

    /// Scatter the particles randomly over the cylinder `[0, R] × [0, 2R]`
    /// and fix radius and temperature for the run.
    ///
    /// Draw order per particle is ρ, θ, then height. On failure the system
    /// keeps its previous state.
    pub fn init_config(&mut self, radius: f64, temperature: f64) -> Result<()> {
        let cylinder = Self::check_conditions(radius, temperature)?;

        let mut positions = Vec::with_capacity(self.positions.len());
        for _ in 0..self.positions.len() {
            let rho = match self.placement {
                Placement::RadialUniform => self.rng.uniform(0.0, radius),
                Placement::AreaUniform => (self.rng.uniform(0.0, radius) * radius).sqrt(),
            };
            let theta = self.rng.uniform(0.0, 2.0 * PI);
            let height = 2.0 * self.rng.uniform(0.0, radius);
            positions.push(Vector3::new(rho * theta.cos(), rho * theta.sin(), height));
        }

        self.commit_initial(positions, cylinder, temperature)
    }

    /// Place the particles at the given coordinates and fix radius and
    /// temperature for the run. On failure the system keeps its previous state.
    pub fn init_explicit(
        &mut self,
        positions: Vec<Vector3<f64>>,
        radius: f64,
        temperature: f64,
    ) -> Result<()> {
        if positions.len() != self.positions.len() {
            return Err(McError::invalid(format!(
                "expected {} positions, got {}",
                self.positions.len(),
                positions.len()
            )));
        }
        let cylinder = Self::check_conditions(radius, temperature)?;

        if let Some(i) = positions.iter().position(|p| !cylinder.contains(p)) {
            return Err(McError::invalid(format!(
                "particle {} at ({}, {}, {}) lies outside the cylinder",
                i, positions[i].x, positions[i].y, positions[i].z
            )));
        }

        self.commit_initial(positions, cylinder, temperature)
    }

    fn commit_initial(
        &mut self,
        positions: Vec<Vector3<f64>>,
        cylinder: Cylinder,
        temperature: f64,
    ) -> Result<()> {
        let energy = self.potential.checked_energy(&positions).map_err(|err| {
            warn!("Initial configuration is degenerate: {}", err);
            err
        })?;

        self.positions = positions;
        self.cylinder = Some(cylinder);
        self.temperature = temperature;
        self.energy = energy;
        self.stats.reset();
        self.sweeps = 0;
        info!(
            "Initialized {} particles (R = {}, T = {}): U = {:.6}",
            self.positions.len(),
            cylinder.radius,
            temperature,
            energy
        );
        Ok(())
    }

    /// Write one position snapshot, then run `steps` sweeps, appending the
    /// post-sweep energy to `energies` after each one if `report_energy` is set.
    pub fn evolve<P, E>(
        &mut self,
        steps: usize,
        max_disp: f64,
        positions: &mut P,
        energies: &mut E,
        report_energy: bool,
    ) -> Result<()>
    where
        P: Write + ?Sized,
        E: Write + ?Sized,
    {
        if self.cylinder.is_none() {
            return Err(McError::invalid(
                "system must be initialized before it can evolve",
            ));
        }
        self.set_max_displacement(max_disp)?;

        info!(
            "Evolving {} particles for {} sweeps (dr = {}, kick range {:?})",
            self.positions.len(),
            steps,
            max_disp,
            self.kick_range
        );

        self.write_positions(positions)?;

        for _ in 0..steps {
            self.sweep()?;
            if report_energy {
                self.write_energy(energies)?;
            }
        }

        info!(
            "Finished {} sweeps: U = {:.6}, acceptance = {:.2}%",
            self.sweeps,
            self.energy,
            100.0 * self.stats.acceptance_rate()
        );
        Ok(())
    }

    /// Emit the current positions to `sink`
    pub fn write_positions<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        sink::write_positions(sink, &self.positions)
    }

    /// Emit the current potential energy to `sink`
    pub fn write_energy<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        sink::write_energy(sink, self.energy)
    }

    pub fn n_particles(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    /// Potential energy of the last committed configuration
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Cylinder radius, or 0 before initialization
    pub fn radius(&self) -> f64 {
        self.cylinder.map_or(0.0, |c| c.radius)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn gamma(&self) -> f64 {
        self.potential.gamma
    }

    pub fn cutoff_squared(&self) -> f64 {
        self.potential.r_cut2
    }

    pub fn max_displacement(&self) -> f64 {
        self.max_displacement
    }

    pub fn kick_range(&self) -> KickRange {
        self.kick_range
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn potential(&self) -> &LennardJonesGravity {
        &self.potential
    }

    pub fn stats(&self) -> &SweepStatistics {
        &self.stats
    }

    /// Number of completed sweeps since initialization
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    pub fn is_initialized(&self) -> bool {
        self.cylinder.is_some()
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{seeded_source, ScriptedSource};
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_particles_rejected() {
        assert!(matches!(
            ParticleSystem::new(0, 1.0),
            Err(McError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_creation() {
        let system = ParticleSystem::new(12, 0.5).unwrap();
        assert_eq!(system.n_particles(), 12);
        assert_eq!(system.positions().len(), 12);
        assert_eq!(system.gamma(), 0.5);
        assert_relative_eq!(system.cutoff_squared(), 6.25);
        assert!(!system.is_initialized());
    }

    #[test]
    fn test_custom_cutoff() {
        let system = ParticleSystem::new(2, 0.0).unwrap().with_cutoff(3.0).unwrap();
        assert_relative_eq!(system.cutoff_squared(), 9.0);
        assert!(ParticleSystem::new(2, 0.0).unwrap().with_cutoff(-1.0).is_err());
    }

    #[test]
    fn test_cutoff_change_refreshes_energy() {
        let mut system = ParticleSystem::new(2, 1.0).unwrap();
        let positions = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(2.0, 0.0, 1.0)];
        system.init_explicit(positions, 3.0, 1.0).unwrap();
        assert_relative_eq!(system.energy(), 2.0 - 0.0615234375, epsilon = 1e-12);

        // pair at r = 2 falls outside the shorter cutoff
        let system = system.with_cutoff(1.5).unwrap();
        let recomputed = system.potential().total_energy(system.positions());
        assert_relative_eq!(system.energy(), recomputed, epsilon = 1e-12);
        assert_relative_eq!(system.energy(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_init_rejects_bad_conditions() {
        let mut system = ParticleSystem::with_rng(4, 1.0, seeded_source(1)).unwrap();
        assert!(system.init_config(0.0, 1.0).is_err());
        assert!(system.init_config(-2.0, 1.0).is_err());
        assert!(system.init_config(2.0, 0.0).is_err());
        assert!(system.init_config(2.0, f64::NAN).is_err());
        assert!(!system.is_initialized());
    }

    #[test]
    fn test_init_places_inside_cylinder() {
        let mut system = ParticleSystem::with_rng(200, 1.0, seeded_source(3)).unwrap();
        system.init_config(3.0, 1.5).unwrap();

        assert_eq!(system.n_particles(), 200);
        for p in system.positions() {
            assert!(p.x * p.x + p.y * p.y <= 9.0 + 1e-12);
            assert!(p.z >= 0.0 && p.z <= 6.0);
        }
        assert_relative_eq!(
            system.energy(),
            system.potential().total_energy(system.positions()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_init_draw_order() {
        // rho, theta, height for each particle; the second sits on the wall
        let rng = ScriptedSource::new(vec![0.5, 0.0, 0.25, 1.0, 0.25, 0.5]);
        let mut system = ParticleSystem::with_rng(2, 0.0, rng).unwrap();
        system.init_config(4.0, 1.0).unwrap();

        let p0 = system.positions()[0];
        assert_relative_eq!(p0.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p0.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p0.z, 2.0, epsilon = 1e-12);

        let p1 = system.positions()[1];
        assert_relative_eq!(p1.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p1.y, 4.0, epsilon = 1e-12);
        assert_relative_eq!(p1.z, 4.0, epsilon = 1e-12);
        assert_eq!(system.rng().draws(), 6);
    }

    #[test]
    fn test_area_uniform_placement() {
        let rng = ScriptedSource::new(vec![0.25, 0.0, 0.5]);
        let mut system = ParticleSystem::with_rng(1, 0.0, rng)
            .unwrap()
            .with_placement(Placement::AreaUniform);
        system.init_config(4.0, 1.0).unwrap();

        // u = 1, rho = sqrt(1 * 4)
        assert_relative_eq!(system.positions()[0].x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(system.positions()[0].z, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_init_explicit_validates() {
        let mut system = ParticleSystem::new(2, 0.0).unwrap();
        let outside = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(3.0, 0.0, 1.0)];
        assert!(system.init_explicit(outside, 2.0, 1.0).is_err());
        assert!(!system.is_initialized());

        let short = vec![Vector3::new(0.0, 0.0, 1.0)];
        assert!(system.init_explicit(short, 2.0, 1.0).is_err());

        let below = vec![Vector3::new(0.0, 0.0, -0.1), Vector3::new(1.0, 0.0, 1.0)];
        assert!(system.init_explicit(below, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_init_explicit_coincident_is_degenerate() {
        let mut system = ParticleSystem::new(2, 0.0).unwrap();
        let same = vec![Vector3::new(0.5, 0.5, 0.5); 2];
        assert!(matches!(
            system.init_explicit(same, 2.0, 1.0),
            Err(McError::NumericDegeneracy { .. })
        ));
        assert!(!system.is_initialized());
    }

    #[test]
    fn test_failed_reinit_keeps_previous_state() {
        let mut system = ParticleSystem::new(2, 1.0).unwrap();
        let positions = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.5, 0.0, 2.0)];
        system.init_explicit(positions.clone(), 3.0, 0.7).unwrap();
        let energy = system.energy();

        let outside = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(5.0, 0.0, 1.0)];
        assert!(system.init_explicit(outside, 3.0, 2.0).is_err());
        let same = vec![Vector3::new(0.5, 0.5, 0.5); 2];
        assert!(matches!(
            system.init_explicit(same, 3.0, 2.0),
            Err(McError::NumericDegeneracy { .. })
        ));
        assert!(system.init_config(-1.0, 2.0).is_err());
        assert!(system.init_config(3.0, 0.0).is_err());

        assert!(system.is_initialized());
        assert_relative_eq!(system.radius(), 3.0);
        assert_relative_eq!(system.temperature(), 0.7);
        assert_eq!(system.positions(), positions.as_slice());
        assert_eq!(system.energy(), energy);
    }

    #[test]
    fn test_evolve_requires_init() {
        let mut system = ParticleSystem::new(3, 1.0).unwrap();
        let mut pos = Vec::new();
        let mut ene = Vec::new();
        let result = system.evolve(1, 0.5, &mut pos, &mut ene, true);
        assert!(matches!(result, Err(McError::InvalidConfiguration(_))));
        assert!(pos.is_empty());
    }

    #[test]
    fn test_evolve_rejects_bad_displacement() {
        let mut system = ParticleSystem::with_rng(3, 1.0, seeded_source(5)).unwrap();
        system.init_config(2.0, 1.0).unwrap();
        let mut pos = Vec::new();
        let mut ene = Vec::new();
        assert!(system.evolve(1, -0.5, &mut pos, &mut ene, true).is_err());
        assert!(system.evolve(1, f64::INFINITY, &mut pos, &mut ene, true).is_err());
    }

    #[test]
    fn test_zero_step_evolve_is_idempotent() {
        let mut system = ParticleSystem::with_rng(10, 1.0, seeded_source(11)).unwrap();
        system.init_config(3.0, 1.0).unwrap();
        let positions = system.positions().to_vec();
        let energy = system.energy();

        let mut pos = Vec::new();
        let mut ene = Vec::new();
        system.evolve(0, 0.5, &mut pos, &mut ene, true).unwrap();

        assert_eq!(system.positions(), positions.as_slice());
        assert_eq!(system.energy(), energy);
        assert!(ene.is_empty());
        let mut expected = Vec::new();
        sink::write_positions(&mut expected, &positions).unwrap();
        assert_eq!(pos, expected);
    }

    #[test]
    fn test_evolve_reports_one_energy_per_sweep() {
        let mut system = ParticleSystem::with_rng(5, 1.0, seeded_source(13)).unwrap();
        system.init_config(3.0, 1.0).unwrap();

        let mut pos = Vec::new();
        let mut ene = Vec::new();
        system.evolve(7, 0.5, &mut pos, &mut ene, true).unwrap();

        let text = String::from_utf8(ene).unwrap();
        assert_eq!(text.split_whitespace().count(), 7);
        assert!(text.ends_with(' '));
        assert_eq!(system.sweeps(), 7);

        let mut silent = Vec::new();
        system.evolve(3, 0.5, &mut pos, &mut silent, false).unwrap();
        assert!(silent.is_empty());
        assert_eq!(system.sweeps(), 10);
    }
}
