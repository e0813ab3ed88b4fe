//! Seeded pseudo-random source.
//!
//! [`RandomSource`] has an explicit lifecycle: it is created empty,
//! initialized with a seed, and reset to release its generator state. Every
//! draw made by the stream engine and its collaborators goes through one
//! source, so a fixed seed reproduces a stream exactly. The backing
//! generator is ChaCha8, whose output is stable across `rand` releases.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal, Poisson};

use crate::error::RandomError;

#[derive(Debug, Clone, Default)]
pub struct RandomSource {
    seed: Option<u64>,
    rng: Option<ChaCha8Rng>,
}

impl RandomSource {
    /// Create an uninitialized source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source already initialized with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            rng: Some(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn initialize(&mut self, seed: u64) -> Result<(), RandomError> {
        if self.rng.is_some() {
            return Err(RandomError::AlreadyInitialized);
        }
        *self = Self::seeded(seed);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.rng.is_some()
    }

    /// Drop the generator state. The source may be initialized again.
    pub fn reset(&mut self) {
        self.seed = None;
        self.rng = None;
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn grab(&mut self) -> Result<&mut ChaCha8Rng, RandomError> {
        self.rng.as_mut().ok_or(RandomError::NotInitialized)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> Result<f64, RandomError> {
        Ok(self.grab()?.r#gen::<f64>())
    }

    /// Uniform draw in `[lo, hi)`.
    pub fn flat(&mut self, lo: f64, hi: f64) -> Result<f64, RandomError> {
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(RandomError::InvalidParameter(format!(
                "flat range [{lo}, {hi}) is empty or not finite"
            )));
        }
        Ok(self.grab()?.gen_range(lo..hi))
    }

    /// Poisson-distributed count with the given mean. A zero mean yields 0.
    pub fn poisson(&mut self, mean: f64) -> Result<u64, RandomError> {
        if !mean.is_finite() || mean < 0.0 {
            return Err(RandomError::InvalidParameter(format!(
                "poisson mean {mean} must be finite and >= 0"
            )));
        }
        let rng = self.grab()?;
        if mean == 0.0 {
            return Ok(0);
        }
        let dist =
            Poisson::new(mean).map_err(|e| RandomError::InvalidParameter(e.to_string()))?;
        Ok(dist.sample(rng) as u64)
    }

    /// Exponentially distributed draw with the given mean (> 0).
    pub fn exponential(&mut self, mean: f64) -> Result<f64, RandomError> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(RandomError::InvalidParameter(format!(
                "exponential mean {mean} must be finite and > 0"
            )));
        }
        let dist =
            Exp::new(1.0 / mean).map_err(|e| RandomError::InvalidParameter(e.to_string()))?;
        Ok(dist.sample(self.grab()?))
    }

    /// Normally distributed draw.
    pub fn gaussian(&mut self, mean: f64, sigma: f64) -> Result<f64, RandomError> {
        let dist =
            Normal::new(mean, sigma).map_err(|e| RandomError::InvalidParameter(e.to_string()))?;
        Ok(dist.sample(self.grab()?))
    }
}
