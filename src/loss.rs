//! Output-layer primitives.
//!
//! Used by the training loop like:
//!
//! - `NeuralNet::forward` ends with [`softmax_in_place`]
//! - [`log_loss_backward`] writes the backprop seed `p - c`
//! - [`cost_mass`] accumulates the reported loss signal

/// Numerically stable softmax, computed in place.
///
/// Subtracts the max before exponentiating and normalizes to sum 1.
#[inline]
pub fn softmax_in_place(xs: &mut [f32]) {
    if xs.is_empty() {
        return;
    }

    let mut max_x = xs[0];
    for &x in xs.iter().skip(1) {
        if x > max_x {
            max_x = x;
        }
    }

    let mut sum_exp = 0.0_f32;
    for x in xs.iter_mut() {
        *x = (*x - max_x).exp();
        sum_exp += *x;
    }

    let inv_sum = 1.0 / sum_exp;
    for x in xs.iter_mut() {
        *x *= inv_sum;
    }
}

/// Softmax + log-loss gradient w.r.t. the pre-softmax scores.
///
/// Writes `d_out[i] = probs[i] - costs[i]`.
///
/// Shape contract: `probs.len() == costs.len() == d_out.len()`.
#[inline]
pub fn log_loss_backward(probs: &[f32], costs: &[f32], d_out: &mut [f32]) {
    assert_eq!(
        probs.len(),
        costs.len(),
        "probs len {} does not match costs len {}",
        probs.len(),
        costs.len()
    );
    assert_eq!(
        probs.len(),
        d_out.len(),
        "probs len {} does not match d_out len {}",
        probs.len(),
        d_out.len()
    );

    for i in 0..probs.len() {
        d_out[i] = probs[i] - costs[i];
    }
}

/// Probability mass assigned to classes with a nonzero cost.
///
/// This is the loss signal reported by `NeuralNet::train`; it is a proxy, not a
/// cross-entropy sum.
#[inline]
pub fn cost_mass(probs: &[f32], costs: &[f32]) -> f32 {
    assert_eq!(
        probs.len(),
        costs.len(),
        "probs len {} does not match costs len {}",
        probs.len(),
        costs.len()
    );

    let mut mass = 0.0_f32;
    for (&p, &c) in probs.iter().zip(costs) {
        if c != 0.0 {
            mass += p;
        }
    }
    mass
}
