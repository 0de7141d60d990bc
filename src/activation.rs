//! Hidden-layer activation functions.
//!
//! Each hidden transition computes `z = W x + b` and then `y = activation(z)`.
//! Only `y` is cached in `Scratch`; backprop recovers `f'(z)` from `y`, so no separate
//! pre-activation buffer is kept. The output transition always uses softmax
//! (see [`crate::loss::softmax_in_place`]) and is not configurable.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Element-wise activation applied by hidden layers.
pub enum Activation {
    #[default]
    ReLU,
    Tanh,
    Identity,
}

impl Activation {
    #[inline]
    pub(crate) fn forward(self, x: f32) -> f32 {
        match self {
            Activation::ReLU => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
        }
    }

    /// Derivative with respect to the pre-activation, expressed via the output `y`.
    #[inline]
    pub(crate) fn grad_from_output(self, y: f32) -> f32 {
        match self {
            Activation::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => 1.0 - y * y,
            Activation::Identity => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(Activation::ReLU.forward(-2.0), 0.0);
        assert_eq!(Activation::ReLU.forward(3.0), 3.0);
        assert_eq!(Activation::ReLU.grad_from_output(0.0), 0.0);
        assert_eq!(Activation::ReLU.grad_from_output(3.0), 1.0);
    }

    #[test]
    fn tanh_gradient_from_output() {
        let y = Activation::Tanh.forward(0.3);
        assert!((Activation::Tanh.grad_from_output(y) - (1.0 - y * y)).abs() < 1e-6);
    }

    #[test]
    fn identity_passes_through() {
        assert_eq!(Activation::Identity.forward(-1.5), -1.5);
        assert_eq!(Activation::Identity.grad_from_output(-1.5), 1.0);
    }
}
