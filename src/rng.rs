use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// A stream of uniform reals over caller-chosen ranges
pub trait RandomSource {
    /// Draw a value uniformly from `[lo, hi)`. An empty range yields `lo`.
    ///
    /// [`ScriptedSource`] relaxes the upper bound to `[lo, hi]`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;
}

impl RandomSource for StdRng {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            Uniform::new(lo, hi).sample(self)
        } else {
            lo
        }
    }
}

/// Random source seeded from OS entropy
pub fn entropy_source() -> StdRng {
    StdRng::from_entropy()
}

/// Random source with a fixed seed
pub fn seeded_source(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Replays a fixed list of unit fractions, cycling when exhausted.
///
/// Each fraction `u` is mapped onto the requested range as `lo + u * (hi - lo)`,
/// so a script is independent of the ranges the sampler asks for. Fractions are
/// taken on the closed interval `[0, 1]`: a fraction of `1.0` yields exactly `hi`,
/// which lets a script pin a particle onto the cylinder wall.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    fractions: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(fractions: Vec<f64>) -> Self {
        Self {
            fractions,
            cursor: 0,
        }
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if self.fractions.is_empty() {
            return lo;
        }
        let u = self.fractions[self.cursor % self.fractions.len()];
        self.cursor += 1;
        lo + u * (hi - lo)
    }
}
