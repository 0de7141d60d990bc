//! Network builder.
//!
//! `NetBuilder` is the recommended way to configure a [`NeuralNet`]: it keeps the width
//! schedule, hidden activation and Adagrad/L2 hyperparameters together and validates
//! them before any buffer is allocated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::net::{validate_eps, validate_eta, validate_rho};
use crate::{Activation, Error, NeuralNet, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Dense-network hyperparameters.
pub struct Hyperparams {
    /// Adagrad learning rate.
    pub eta: f32,
    /// Adagrad denominator epsilon.
    pub eps: f32,
    /// L2 coefficient; 0 disables regularization.
    pub rho: f32,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            eta: 0.005,
            eps: 1e-6,
            rho: 0.0,
        }
    }
}

impl Hyperparams {
    pub fn validate(self) -> Result<()> {
        validate_eta(self.eta)?;
        validate_eps(self.eps)?;
        validate_rho(self.rho)
    }
}

#[derive(Debug, Clone)]
/// Builder for a `NeuralNet`.
///
/// ```rust
/// use sparse_mlp::{Activation, NetBuilder};
///
/// # fn main() -> sparse_mlp::Result<()> {
/// let net = NetBuilder::new(&[8, 16, 3])?
///     .hidden_activation(Activation::Tanh)
///     .eta(0.01)
///     .build_with_seed(0)?;
/// assert_eq!(net.nr_out(), 3);
/// # Ok(())
/// # }
/// ```
pub struct NetBuilder {
    widths: Vec<usize>,
    hidden: Activation,
    hyper: Hyperparams,
}

impl NetBuilder {
    /// Start from a width schedule: input width first, output width last.
    pub fn new(widths: &[usize]) -> Result<Self> {
        if widths.len() < 2 {
            return Err(Error::InvalidConfig(
                "widths must include input and output layers".to_owned(),
            ));
        }
        if widths.contains(&0) {
            return Err(Error::InvalidConfig(
                "all layer widths must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            widths: widths.to_vec(),
            hidden: Activation::default(),
            hyper: Hyperparams::default(),
        })
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.hidden = activation;
        self
    }

    pub fn hyperparams(mut self, hyper: Hyperparams) -> Self {
        self.hyper = hyper;
        self
    }

    pub fn eta(mut self, eta: f32) -> Self {
        self.hyper.eta = eta;
        self
    }

    pub fn eps(mut self, eps: f32) -> Self {
        self.hyper.eps = eps;
        self
    }

    pub fn rho(mut self, rho: f32) -> Self {
        self.hyper.rho = rho;
        self
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<NeuralNet> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<NeuralNet> {
        self.hyper.validate()?;
        let Hyperparams { eta, eps, rho } = self.hyper;
        NeuralNet::new_with_rng(&self.widths, self.hidden, eta, eps, rho, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_short_or_zero_widths() {
        assert!(NetBuilder::new(&[4]).is_err());
        assert!(NetBuilder::new(&[4, 0, 2]).is_err());
    }

    #[test]
    fn builder_validates_hyperparams_at_build() {
        assert!(NetBuilder::new(&[2, 2]).unwrap().eta(-1.0).build_with_seed(0).is_err());
        assert!(NetBuilder::new(&[2, 2]).unwrap().eps(0.0).build_with_seed(0).is_err());
        assert!(NetBuilder::new(&[2, 2]).unwrap().rho(f32::INFINITY).build_with_seed(0).is_err());
    }

    #[test]
    fn builder_applies_settings() {
        let net = NetBuilder::new(&[3, 4, 2])
            .unwrap()
            .hidden_activation(Activation::Identity)
            .hyperparams(Hyperparams {
                eta: 0.1,
                eps: 1e-8,
                rho: 1e-3,
            })
            .build_with_seed(1)
            .unwrap();
        assert_eq!(net.widths(), &[3, 4, 2]);
        assert_eq!(net.hidden_activation(), Activation::Identity);
        assert_eq!((net.eta(), net.eps(), net.rho()), (0.1, 1e-8, 1e-3));
    }

    #[test]
    fn same_seed_same_weights() {
        let a = NetBuilder::new(&[3, 5, 2]).unwrap().build_with_seed(9).unwrap();
        let b = NetBuilder::new(&[3, 5, 2]).unwrap().build_with_seed(9).unwrap();
        assert_eq!(a.weights(), b.weights());
    }
}
