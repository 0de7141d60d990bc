//! Initializers.
//!
//! Embedding vectors are created lazily, so the input layer needs a sampling service
//! it can call whenever a new key shows up. Anything implementing [`Initializer`]
//! works, including plain closures `FnMut(&mut [f32])`.
//!
//! Dense weights use [`scaled_normal`] (He-style: `std = sqrt(2 / fan_in)`).

use rand::Rng;
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::{Error, Result};

/// Fills a freshly allocated parameter vector.
pub trait Initializer {
    fn fill(&mut self, out: &mut [f32]);
}

impl<F: FnMut(&mut [f32])> Initializer for F {
    #[inline]
    fn fill(&mut self, out: &mut [f32]) {
        self(out)
    }
}

/// Seeded uniform sampler over `[lo, hi)`.
#[derive(Debug, Clone)]
pub struct UniformInit {
    rng: StdRng,
    dist: Uniform<f32>,
}

impl UniformInit {
    pub fn new(lo: f32, hi: f32, seed: u64) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(Error::InvalidConfig(format!(
                "uniform init range must be finite with lo < hi, got [{lo}, {hi})"
            )));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            dist: Uniform::new(lo, hi),
        })
    }

    /// `[-0.1, 0.1)`, the usual range for embedding tables.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dist: Uniform::new(-0.1, 0.1),
        }
    }
}

impl Initializer for UniformInit {
    fn fill(&mut self, out: &mut [f32]) {
        for v in out.iter_mut() {
            *v = self.dist.sample(&mut self.rng);
        }
    }
}

/// Fill `out` from `N(0, sqrt(2 / fan_in))`.
pub fn scaled_normal<R: Rng + ?Sized>(out: &mut [f32], fan_in: usize, rng: &mut R) -> Result<()> {
    if fan_in == 0 {
        return Err(Error::InvalidConfig("fan_in must be > 0".to_owned()));
    }

    let std = (2.0 / fan_in as f32).sqrt();
    let normal = Normal::new(0.0_f32, std)
        .map_err(|e| Error::InvalidConfig(format!("invalid normal std {std}: {e}")))?;
    for v in out.iter_mut() {
        *v = normal.sample(rng);
    }
    Ok(())
}
