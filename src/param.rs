//! Per-key sparse parameters.
//!
//! A [`Parameter`] holds three equally long buffers:
//!
//! - `curr`: the vector being trained,
//! - `avg`: a lagged average of `curr`, used at prediction time,
//! - `step`: the momentum accumulator.
//!
//! The update rule is bound at creation via [`UpdateRule`].

use crate::error::try_zeros;
use crate::{Error, Initializer, Result};

/// Number of updates during which `avg` simply tracks `curr`.
pub const AVERAGING_WARMUP: u64 = 1000;
pub const ALPHA_MIN: f32 = 0.001;
pub const ALPHA_MAX: f32 = 0.9;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Update rule applied to a sparse parameter.
pub enum UpdateRule {
    /// Averaged SGD with momentum.
    #[default]
    Asgd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    curr: Vec<f32>,
    avg: Vec<f32>,
    step: Vec<f32>,
    rule: UpdateRule,
}

impl Parameter {
    /// Build from an initial vector: `curr = avg = init`, `step = 0`.
    ///
    /// For callers that already own the vector. Tables allocate through
    /// [`Parameter::try_new`], which reports allocation failure instead of aborting.
    pub fn new(init: Vec<f32>) -> Self {
        let len = init.len();
        Self {
            avg: init.clone(),
            curr: init,
            step: vec![0.0; len],
            rule: UpdateRule::Asgd,
        }
    }

    /// Allocate a `len`-wide parameter and draw its initial value from `init`.
    ///
    /// All three buffers are reserved before anything is written.
    pub fn try_new(len: usize, init: &mut dyn Initializer) -> Result<Self> {
        let mut curr = try_zeros(len)?;
        let mut avg = try_zeros(len)?;
        let step = try_zeros(len)?;

        init.fill(&mut curr);
        avg.copy_from_slice(&curr);

        Ok(Self {
            curr,
            avg,
            step,
            rule: UpdateRule::Asgd,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.curr.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.curr.is_empty()
    }

    #[inline]
    pub fn curr(&self) -> &[f32] {
        &self.curr
    }

    #[inline]
    pub fn avg(&self) -> &[f32] {
        &self.avg
    }

    #[inline]
    pub fn step(&self) -> &[f32] {
        &self.step
    }

    #[inline]
    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    /// `avg` when `use_avg`, otherwise `curr`.
    #[inline]
    pub fn values(&self, use_avg: bool) -> &[f32] {
        if use_avg { &self.avg } else { &self.curr }
    }

    /// Apply the bound update rule with gradient `grad` at step `t`.
    ///
    /// Fails with `NumericDegenerate` when `t == 0` and `InvalidInput` when
    /// `grad.len() != self.len()`; nothing is modified in either case.
    pub fn update(&mut self, grad: &[f32], t: u64, eta: f32, mu: f32) -> Result<()> {
        if t == 0 {
            return Err(Error::NumericDegenerate(
                "update step t must be >= 1".to_owned(),
            ));
        }
        if grad.len() != self.len() {
            return Err(Error::InvalidInput(format!(
                "gradient len {} does not match parameter len {}",
                grad.len(),
                self.len()
            )));
        }

        match self.rule {
            UpdateRule::Asgd => self.asgd(grad, t, eta, mu),
        }
        Ok(())
    }

    fn asgd(&mut self, grad: &[f32], t: u64, eta: f32, mu: f32) {
        let alpha = asgd_alpha(t);
        let averaging = t >= AVERAGING_WARMUP;

        for i in 0..self.curr.len() {
            self.step[i] = mu * self.step[i] - grad[i];
            self.curr[i] += eta * self.step[i];
            if averaging {
                self.avg[i] = (1.0 - alpha) * self.avg[i] + alpha * self.curr[i];
            } else {
                self.avg[i] = self.curr[i];
            }
        }
    }
}

/// Averaging weight at step `t`: `clamp(1/t, ALPHA_MIN, ALPHA_MAX)`.
#[inline]
pub fn asgd_alpha(t: u64) -> f32 {
    (1.0 / t as f32).clamp(ALPHA_MIN, ALPHA_MAX)
}
