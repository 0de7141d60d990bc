use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::try_zeros;
use crate::init::scaled_normal;
use crate::{Activation, Error, Result, loss, vecmath};

/// Bias every non-output transition starts with.
pub const HIDDEN_BIAS_INIT: f32 = 0.2;

/// Dense feedforward network with a softmax output.
///
/// All parameters live in one flat buffer. For each transition `i` the row-major
/// `(widths[i+1], widths[i])` weight matrix is immediately followed by its
/// `widths[i+1]` biases, and transitions are concatenated in layer order.
/// `support` has the same layout and holds the Adagrad squared-gradient sums.
#[derive(Debug, Clone)]
pub struct NeuralNet {
    widths: Vec<usize>,
    offsets: Vec<usize>,
    weights: Vec<f32>,
    support: Vec<f32>,
    hidden: Activation,
    eta: f32,
    eps: f32,
    rho: f32,
}

/// Per-example forward/backward buffers.
///
/// `activations[l]` and `deltas[l]` have length `widths[l]`. Allocate once per
/// network via [`NeuralNet::scratch`] and wipe between examples.
#[derive(Debug, Clone)]
pub struct Scratch {
    activations: Vec<Vec<f32>>,
    deltas: Vec<Vec<f32>>,
}

/// `Σ_{i} (widths[i+1] * widths[i] + widths[i+1])`.
pub fn nr_weight(widths: &[usize]) -> usize {
    widths.windows(2).map(|w| w[1] * w[0] + w[1]).sum()
}

impl NeuralNet {
    /// Build with default hidden activation, seeded from OS entropy.
    pub fn new(widths: &[usize], eta: f32, eps: f32, rho: f32) -> Result<Self> {
        let mut rng = StdRng::from_entropy();
        Self::new_with_rng(widths, Activation::default(), eta, eps, rho, &mut rng)
    }

    pub fn new_with_seed(widths: &[usize], eta: f32, eps: f32, rho: f32, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(widths, Activation::default(), eta, eps, rho, &mut rng)
    }

    pub fn new_with_rng<R: Rng + ?Sized>(
        widths: &[usize],
        hidden: Activation,
        eta: f32,
        eps: f32,
        rho: f32,
        rng: &mut R,
    ) -> Result<Self> {
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
        validate_eta(eta)?;
        validate_eps(eps)?;
        validate_rho(rho)?;

        let mut offsets = Vec::with_capacity(widths.len() - 1);
        let mut total = 0_usize;
        for w in widths.windows(2) {
            offsets.push(total);
            total = w[1]
                .checked_mul(w[0])
                .and_then(|n| n.checked_add(w[1]))
                .and_then(|n| n.checked_add(total))
                .ok_or_else(|| Error::InvalidConfig("nr_weight overflow".to_owned()))?;
        }

        let mut weights = try_zeros(total)?;
        let support = try_zeros(total)?;

        // The output transition stays at zero.
        for i in 0..widths.len() - 2 {
            let (n_in, n_out) = (widths[i], widths[i + 1]);
            let start = offsets[i];
            let (w, b) = weights[start..start + n_out * n_in + n_out].split_at_mut(n_out * n_in);
            scaled_normal(w, n_in, rng)?;
            b.fill(HIDDEN_BIAS_INIT);
        }

        log::info!("neural net: widths={widths:?} nr_weight={total} hidden={hidden:?}");

        Ok(Self {
            widths: widths.to_vec(),
            offsets,
            weights,
            support,
            hidden,
            eta,
            eps,
            rho,
        })
    }

    /// Rebuild a network from previously exported buffers.
    ///
    /// Validates widths, hyperparameters, buffer lengths and finiteness.
    pub fn from_parts(
        widths: &[usize],
        hidden: Activation,
        eta: f32,
        eps: f32,
        rho: f32,
        weights: Vec<f32>,
        support: Vec<f32>,
    ) -> Result<Self> {
        // Initial values are overwritten below.
        let mut net = Self::new_with_rng(
            widths,
            hidden,
            eta,
            eps,
            rho,
            &mut StdRng::seed_from_u64(0),
        )?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidInput(
                "weights must contain only finite values".to_owned(),
            ));
        }
        net.set_weights(&weights)?;
        net.set_support(&support)?;
        Ok(net)
    }

    #[inline]
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    #[inline]
    pub fn nr_layer(&self) -> usize {
        self.widths.len()
    }

    #[inline]
    pub fn nr_weight(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn nr_in(&self) -> usize {
        self.widths[0]
    }

    #[inline]
    pub fn nr_out(&self) -> usize {
        self.widths[self.widths.len() - 1]
    }

    #[inline]
    pub fn hidden_activation(&self) -> Activation {
        self.hidden
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn support(&self) -> &[f32] {
        &self.support
    }

    /// Replace the whole weight buffer.
    pub fn set_weights(&mut self, weights: &[f32]) -> Result<()> {
        check_len("weights", weights.len(), self.nr_weight())?;
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    /// Replace the whole Adagrad support buffer.
    pub fn set_support(&mut self, support: &[f32]) -> Result<()> {
        check_len("support", support.len(), self.nr_weight())?;
        if support.iter().any(|&s| !(s.is_finite() && s >= 0.0)) {
            return Err(Error::InvalidInput(
                "support must be finite and >= 0".to_owned(),
            ));
        }
        self.support.copy_from_slice(support);
        Ok(())
    }

    #[inline]
    pub fn eta(&self) -> f32 {
        self.eta
    }

    #[inline]
    pub fn eps(&self) -> f32 {
        self.eps
    }

    #[inline]
    pub fn rho(&self) -> f32 {
        self.rho
    }

    pub fn set_eta(&mut self, eta: f32) -> Result<()> {
        validate_eta(eta)?;
        self.eta = eta;
        Ok(())
    }

    pub fn set_eps(&mut self, eps: f32) -> Result<()> {
        validate_eps(eps)?;
        self.eps = eps;
        Ok(())
    }

    pub fn set_rho(&mut self, rho: f32) -> Result<()> {
        validate_rho(rho)?;
        self.rho = rho;
        Ok(())
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self)
    }

    /// Weight matrix and bias vector of transition `i`.
    #[inline]
    fn transition(&self, i: usize) -> (&[f32], &[f32]) {
        let (n_in, n_out) = (self.widths[i], self.widths[i + 1]);
        let start = self.offsets[i];
        self.weights[start..start + n_out * n_in + n_out].split_at(n_out * n_in)
    }

    /// Allocating inference: `softmax(net(input))` as an owned vector.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        let mut scratch = self.scratch();
        Ok(self.forward(input, &mut scratch)?.to_vec())
    }

    /// Forward pass for a single example.
    ///
    /// Writes every layer's activation into `scratch` and returns the softmax output.
    /// Never touches `weights` or `support`.
    pub fn forward<'a>(&self, input: &[f32], scratch: &'a mut Scratch) -> Result<&'a [f32]> {
        if input.len() != self.nr_in() {
            return Err(Error::InvalidInput(format!(
                "input len {} does not match nr_in {}",
                input.len(),
                self.nr_in()
            )));
        }
        self.check_scratch(scratch)?;

        scratch.activations[0].copy_from_slice(input);

        let last = self.nr_layer() - 2;
        for i in 0..=last {
            let n_in = self.widths[i];
            let (w, b) = self.transition(i);

            let (left, right) = scratch.activations.split_at_mut(i + 1);
            let x = &left[i];
            let y = &mut right[0];

            for (o, out) in y.iter_mut().enumerate() {
                let z = b[o] + vecmath::dot(&w[o * n_in..(o + 1) * n_in], x);
                *out = if i == last { z } else { self.hidden.forward(z) };
            }
            if i == last {
                loss::softmax_in_place(y);
            }
        }

        Ok(scratch.output())
    }

    /// Backpropagate the seed stored in `scratch.d_output_mut()`.
    ///
    /// Call `forward` first with the same `scratch`. Returns `delta[0]`, the gradient
    /// w.r.t. the network input.
    pub fn backward<'a>(&self, scratch: &'a mut Scratch) -> Result<&'a [f32]> {
        self.check_scratch(scratch)?;

        for i in (0..self.nr_layer() - 1).rev() {
            let (n_in, n_out) = (self.widths[i], self.widths[i + 1]);
            let (w, _) = self.transition(i);

            let (left, right) = scratch.deltas.split_at_mut(i + 1);
            let d_in = &mut left[i];
            let d_out = &right[0];

            d_in.fill(0.0);
            for o in 0..n_out {
                vecmath::add_scaled(d_in, d_out[o], &w[o * n_in..(o + 1) * n_in]);
            }

            // Input layer is linear: no derivative at layer 0.
            if i > 0 {
                for (d, &a) in d_in.iter_mut().zip(&scratch.activations[i]) {
                    *d *= self.hidden.grad_from_output(a);
                }
            }
        }

        Ok(&scratch.deltas[0])
    }

    /// Accumulate this example's weight gradient into `gradient` (summed, not averaged).
    pub fn set_gradients(&self, scratch: &Scratch, gradient: &mut [f32]) -> Result<()> {
        check_len("gradient", gradient.len(), self.nr_weight())?;
        self.check_scratch(scratch)?;

        for i in 0..self.nr_layer() - 1 {
            let (n_in, n_out) = (self.widths[i], self.widths[i + 1]);
            let start = self.offsets[i];
            let (g_w, g_b) =
                gradient[start..start + n_out * n_in + n_out].split_at_mut(n_out * n_in);

            let x = &scratch.activations[i];
            let d = &scratch.deltas[i + 1];
            for o in 0..n_out {
                vecmath::add_scaled(&mut g_w[o * n_in..(o + 1) * n_in], d[o], x);
                g_b[o] += d[o];
            }
        }
        Ok(())
    }

    /// `gradient += rho * weights`.
    pub fn l2_regularize(&self, gradient: &mut [f32]) -> Result<()> {
        check_len("gradient", gradient.len(), self.nr_weight())?;
        if self.rho != 0.0 {
            vecmath::add_scaled(gradient, self.rho, &self.weights);
        }
        Ok(())
    }

    /// Adagrad step over every weight.
    pub fn adagrad_update(&mut self, gradient: &[f32]) -> Result<()> {
        check_len("gradient", gradient.len(), self.nr_weight())?;

        for ((w, s), &g) in self.weights.iter_mut().zip(&mut self.support).zip(gradient) {
            *s += g * g;
            *w -= self.eta * g / (s.sqrt() + self.eps);
        }
        Ok(())
    }

    /// Train on one minibatch of `(input, costs)` pairs and return the summed loss.
    ///
    /// The loss is the probability mass the network puts on units whose cost is
    /// nonzero, summed over the batch.
    pub fn train<X, C>(&mut self, batch: &[(X, C)]) -> Result<f32>
    where
        X: AsRef<[f32]>,
        C: AsRef<[f32]>,
    {
        self.train_with(batch, |_, _| {})
    }

    /// Like [`NeuralNet::train`], additionally calling `on_input_grad(idx, delta0)`
    /// for every example with the gradient w.r.t. its input.
    ///
    /// All shapes are checked before any buffer is allocated or any weight changes.
    pub fn train_with<X, C, F>(&mut self, batch: &[(X, C)], mut on_input_grad: F) -> Result<f32>
    where
        X: AsRef<[f32]>,
        C: AsRef<[f32]>,
        F: FnMut(usize, &[f32]),
    {
        if batch.is_empty() {
            return Err(Error::InvalidInput("batch must not be empty".to_owned()));
        }
        for (idx, (input, costs)) in batch.iter().enumerate() {
            let (input, costs) = (input.as_ref(), costs.as_ref());
            if input.len() != self.nr_in() {
                return Err(Error::InvalidInput(format!(
                    "example {idx}: input len {} does not match nr_in {}",
                    input.len(),
                    self.nr_in()
                )));
            }
            if costs.len() != self.nr_out() {
                return Err(Error::InvalidInput(format!(
                    "example {idx}: costs len {} does not match nr_out {}",
                    costs.len(),
                    self.nr_out()
                )));
            }
        }

        let mut scratch = self.scratch();
        let mut gradient = try_zeros(self.nr_weight())?;
        let mut total = 0.0_f32;

        for (idx, (input, costs)) in batch.iter().enumerate() {
            let (input, costs) = (input.as_ref(), costs.as_ref());
            scratch.wipe();
            self.forward(input, &mut scratch)?;
            total += scratch.seed_from_costs(costs);
            let d_input = self.backward(&mut scratch)?;
            on_input_grad(idx, d_input);
            self.set_gradients(&scratch, &mut gradient)?;
        }

        self.l2_regularize(&mut gradient)?;
        self.adagrad_update(&gradient)?;

        log::debug!("train: batch={} loss={total}", batch.len());
        Ok(total)
    }

    fn check_scratch(&self, scratch: &Scratch) -> Result<()> {
        let matches = scratch.activations.len() == self.nr_layer()
            && scratch.deltas.len() == self.nr_layer()
            && scratch
                .activations
                .iter()
                .zip(&scratch.deltas)
                .zip(&self.widths)
                .all(|((a, d), &w)| a.len() == w && d.len() == w);
        if !matches {
            return Err(Error::InvalidInput(format!(
                "scratch was not built for a network with widths {:?}",
                self.widths
            )));
        }
        Ok(())
    }
}

impl Scratch {
    pub fn new(net: &NeuralNet) -> Self {
        let activations: Vec<Vec<f32>> = net.widths.iter().map(|&w| vec![0.0; w]).collect();
        Self {
            deltas: activations.clone(),
            activations,
        }
    }

    /// Zero every buffer without reallocating.
    pub fn wipe(&mut self) {
        for buf in self.activations.iter_mut().chain(self.deltas.iter_mut()) {
            buf.fill(0.0);
        }
    }

    /// Softmax output of the most recent forward pass.
    #[inline]
    pub fn output(&self) -> &[f32] {
        let last = self.activations.len() - 1;
        &self.activations[last]
    }

    #[inline]
    pub fn activation(&self, layer: usize) -> &[f32] {
        &self.activations[layer]
    }

    #[inline]
    pub fn delta(&self, layer: usize) -> &[f32] {
        &self.deltas[layer]
    }

    /// Backprop seed buffer for the output layer.
    #[inline]
    pub fn d_output_mut(&mut self) -> &mut [f32] {
        let last = self.deltas.len() - 1;
        &mut self.deltas[last]
    }

    /// Write the seed `p - costs` and return the cost-weighted loss for this example.
    fn seed_from_costs(&mut self, costs: &[f32]) -> f32 {
        let last = self.activations.len() - 1;
        let probs = &self.activations[last];
        loss::log_loss_backward(probs, costs, &mut self.deltas[last]);
        loss::cost_mass(probs, costs)
    }
}

#[inline]
fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::InvalidInput(format!(
            "{what} len {got} does not match nr_weight {expected}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_eta(eta: f32) -> Result<()> {
    if !(eta.is_finite() && eta > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "eta must be finite and > 0, got {eta}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_eps(eps: f32) -> Result<()> {
    if !(eps.is_finite() && eps > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "eps must be finite and > 0, got {eps}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_rho(rho: f32) -> Result<()> {
    if !(rho.is_finite() && rho >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "rho must be finite and >= 0, got {rho}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(analytic: f32, numeric: f32, abs_tol: f32, rel_tol: f32) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    /// Cross-entropy against a one-hot target; its gradient w.r.t. the softmax
    /// scores is exactly the `p - c` seed.
    fn xent(net: &NeuralNet, input: &[f32], target: &[f32], scratch: &mut Scratch) -> f32 {
        let probs = net.forward(input, scratch).unwrap();
        -probs
            .iter()
            .zip(target)
            .map(|(&p, &t)| t * p.ln())
            .sum::<f32>()
    }

    fn randomize_output(net: &mut NeuralNet, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut w = net.weights().to_vec();
        let last = net.nr_layer() - 2;
        let start = net.offsets[last];
        for v in &mut w[start..] {
            *v = rng.gen_range(-0.5..0.5);
        }
        net.set_weights(&w).unwrap();
    }

    #[test]
    fn nr_weight_matches_closed_form() {
        for widths in [vec![2, 3, 2], vec![5, 1], vec![4, 8, 8, 3]] {
            let net = NeuralNet::new_with_seed(&widths, 0.005, 1e-6, 0.0, 0).unwrap();
            let expected: usize = (0..widths.len() - 1)
                .map(|i| widths[i + 1] * widths[i] + widths[i + 1])
                .sum();
            assert_eq!(net.nr_weight(), expected);
            assert_eq!(nr_weight(&widths), expected);
            assert_eq!(net.weights().len(), expected);
            assert_eq!(net.support().len(), expected);
        }
    }

    #[test]
    fn construction_rejects_bad_config() {
        assert!(NeuralNet::new_with_seed(&[3], 0.1, 1e-6, 0.0, 0).is_err());
        assert!(NeuralNet::new_with_seed(&[3, 0, 2], 0.1, 1e-6, 0.0, 0).is_err());
        assert!(NeuralNet::new_with_seed(&[3, 2], 0.0, 1e-6, 0.0, 0).is_err());
        assert!(NeuralNet::new_with_seed(&[3, 2], 0.1, 0.0, 0.0, 0).is_err());
        assert!(NeuralNet::new_with_seed(&[3, 2], 0.1, 1e-6, -1.0, 0).is_err());
    }

    #[test]
    fn init_layout_hidden_random_output_zero() {
        let net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 7).unwrap();
        let (w0, b0) = net.transition(0);
        let (w1, b1) = net.transition(1);

        assert_eq!(w0.len(), 6);
        assert!(w0.iter().any(|&v| v != 0.0));
        assert!(b0.iter().all(|&v| v == HIDDEN_BIAS_INIT));
        assert!(w1.iter().chain(b1).all(|&v| v == 0.0));
        assert!(net.support().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_output_layer_gives_uniform_distribution() {
        let net = NeuralNet::new_with_seed(&[4, 6, 5], 0.005, 1e-6, 0.0, 3).unwrap();
        for input in [[0.0_f32; 4], [1.0, -2.0, 3.0, 0.5], [100.0, 0.0, -7.0, 2.0]] {
            let out = net.predict(&input).unwrap();
            for &p in &out {
                assert!((p - 0.2).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn forward_is_a_distribution_and_idempotent() {
        let mut net = NeuralNet::new_with_seed(&[3, 5, 4], 0.005, 1e-6, 0.0, 1).unwrap();
        randomize_output(&mut net, 11);

        let input = [0.3_f32, -1.2, 2.0];
        let mut scratch = net.scratch();
        let a = net.forward(&input, &mut scratch).unwrap().to_vec();
        let b = net.forward(&input, &mut scratch).unwrap().to_vec();
        assert_eq!(a, b);

        let sum: f32 = a.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(a.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        assert!(matches!(
            net.predict(&[1.0, 2.0, 3.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn forward_rejects_foreign_scratch() {
        let a = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        let b = NeuralNet::new_with_seed(&[2, 4, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        let mut scratch = b.scratch();
        assert!(a.forward(&[0.0, 1.0], &mut scratch).is_err());
    }

    #[test]
    fn backward_matches_numeric_gradients() {
        for hidden in [Activation::Tanh, Activation::Identity] {
            let mut rng = StdRng::seed_from_u64(5);
            let mut net =
                NeuralNet::new_with_rng(&[3, 4, 3], hidden, 0.005, 1e-6, 0.0, &mut rng).unwrap();
            randomize_output(&mut net, 9);

            let input = [0.4_f32, -0.3, 0.8];
            let target = [0.0_f32, 1.0, 0.0];

            let mut scratch = net.scratch();
            net.forward(&input, &mut scratch).unwrap();
            scratch.seed_from_costs(&target);
            let d_input = net.backward(&mut scratch).unwrap().to_vec();
            let mut grad = vec![0.0_f32; net.nr_weight()];
            net.set_gradients(&scratch, &mut grad).unwrap();

            let eps = 1e-2_f32;
            let mut tmp = net.scratch();

            for p in 0..net.nr_weight() {
                let orig = net.weights[p];
                net.weights[p] = orig + eps;
                let plus = xent(&net, &input, &target, &mut tmp);
                net.weights[p] = orig - eps;
                let minus = xent(&net, &input, &target, &mut tmp);
                net.weights[p] = orig;

                assert_close(grad[p], (plus - minus) / (2.0 * eps), 1e-3, 1e-2);
            }

            let mut x = input;
            for i in 0..x.len() {
                let orig = x[i];
                x[i] = orig + eps;
                let plus = xent(&net, &x, &target, &mut tmp);
                x[i] = orig - eps;
                let minus = xent(&net, &x, &target, &mut tmp);
                x[i] = orig;

                assert_close(d_input[i], (plus - minus) / (2.0 * eps), 1e-3, 1e-2);
            }
        }
    }

    #[test]
    fn gradients_are_summed_over_examples() {
        let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 4).unwrap();
        randomize_output(&mut net, 2);
        let input = [0.5_f32, -0.5];
        let costs = [1.0_f32, 0.0];

        let mut scratch = net.scratch();
        let mut once = vec![0.0_f32; net.nr_weight()];
        let mut twice = vec![0.0_f32; net.nr_weight()];
        for _ in 0..2 {
            scratch.wipe();
            net.forward(&input, &mut scratch).unwrap();
            scratch.seed_from_costs(&costs);
            net.backward(&mut scratch).unwrap();
            net.set_gradients(&scratch, &mut twice).unwrap();
        }
        net.set_gradients(&scratch, &mut once).unwrap();

        for (a, b) in once.iter().zip(&twice) {
            assert!((2.0 * a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn adagrad_matches_formula_and_support_grows() {
        let mut net = NeuralNet::new_with_seed(&[1, 1], 0.5, 1e-6, 0.0, 0).unwrap();
        net.set_weights(&[1.0, 0.0]).unwrap();

        net.adagrad_update(&[2.0, 0.0]).unwrap();
        assert_eq!(net.support(), &[4.0, 0.0]);
        assert!((net.weights()[0] - (1.0 - 0.5 * 2.0 / (2.0 + 1e-6))).abs() < 1e-6);
        assert_eq!(net.weights()[1], 0.0);

        net.adagrad_update(&[-1.0, 0.0]).unwrap();
        assert_eq!(net.support(), &[5.0, 0.0]);
    }

    #[test]
    fn l2_adds_scaled_weights() {
        let mut net = NeuralNet::new_with_seed(&[1, 1], 0.5, 1e-6, 0.1, 0).unwrap();
        net.set_weights(&[2.0, -4.0]).unwrap();
        let mut grad = vec![1.0_f32, 1.0];
        net.l2_regularize(&mut grad).unwrap();
        assert!((grad[0] - 1.2).abs() < 1e-6);
        assert!((grad[1] - 0.6).abs() < 1e-6);

        net.set_rho(0.0).unwrap();
        let mut grad = vec![1.0_f32, 1.0];
        net.l2_regularize(&mut grad).unwrap();
        assert_eq!(grad, vec![1.0, 1.0]);
    }

    #[test]
    fn train_reports_cost_mass_and_skips_zero_cost_examples() {
        let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        let x = [1.0_f32, 0.0];
        let zero = [0.0_f32, 0.0];
        let wrong = [0.0_f32, 1.0];

        // Uniform output before training: each costed unit contributes 0.5.
        let loss = net.clone().train(&[(&x, &wrong)]).unwrap();
        assert!((loss - 0.5).abs() < 1e-6);

        let loss = net.train(&[(&x, &zero), (&x, &wrong)]).unwrap();
        assert!((loss - 0.5).abs() < 1e-6);
    }

    #[test]
    fn train_validates_the_whole_batch_first() {
        let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        let before = net.weights().to_vec();
        let good = [1.0_f32, 0.0];
        let bad = [1.0_f32];
        let costs = [0.0_f32, 1.0];

        let empty: [(&[f32], &[f32]); 0] = [];
        assert!(net.train(&empty).is_err());
        assert!(
            net.train(&[(&good[..], &costs[..]), (&bad[..], &costs[..])])
                .is_err()
        );
        assert!(net.train(&[(&good, &bad)]).is_err());
        assert_eq!(net.weights(), &before[..]);
        assert!(net.support().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn train_passes_input_gradients_in_order() {
        let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        randomize_output(&mut net, 1);
        let a = [1.0_f32, 0.0];
        let b = [0.0_f32, 1.0];
        let costs = [0.0_f32, 1.0];

        let mut seen = Vec::new();
        net.train_with(&[(&a, &costs), (&b, &costs)], |idx, d| {
            assert_eq!(d.len(), 2);
            seen.push(idx);
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn manual_step_through_scratch_matches_train() {
        let mut manual = NeuralNet::new_with_seed(&[3, 4, 2], 0.05, 1e-6, 1e-3, 5).unwrap();
        randomize_output(&mut manual, 6);
        let mut trained = manual.clone();
        let batch = [
            ([0.5_f32, -1.0, 0.25], [1.0_f32, 0.0]),
            ([-0.5, 0.5, 1.0], [0.0, 1.0]),
        ];

        let mut scratch = manual.scratch();
        let mut gradient = vec![0.0_f32; manual.nr_weight()];
        for (input, costs) in &batch {
            scratch.wipe();
            manual.forward(input, &mut scratch).unwrap();
            assert_eq!(scratch.activation(0), &input[..]);

            let probs = scratch.output().to_vec();
            for ((d, p), c) in scratch.d_output_mut().iter_mut().zip(&probs).zip(costs) {
                *d = p - c;
            }
            let d_input = manual.backward(&mut scratch).unwrap().to_vec();
            assert_eq!(scratch.delta(0), &d_input[..]);
            manual.set_gradients(&scratch, &mut gradient).unwrap();
        }
        manual.l2_regularize(&mut gradient).unwrap();
        manual.adagrad_update(&gradient).unwrap();

        trained.train(&batch).unwrap();
        for (a, b) in manual.weights().iter().zip(trained.weights()) {
            assert!((a - b).abs() < 1e-6, "manual={a} train={b}");
        }
        for (a, b) in manual.support().iter().zip(trained.support()) {
            assert!((a - b).abs() < 1e-6, "manual={a} train={b}");
        }
    }

    #[test]
    fn setters_validate() {
        let mut net = NeuralNet::new_with_seed(&[2, 2], 0.005, 1e-6, 0.0, 0).unwrap();
        assert!(net.set_eta(f32::NAN).is_err());
        assert!(net.set_eps(-1.0).is_err());
        assert!(net.set_rho(-0.1).is_err());
        assert!(net.set_weights(&[0.0; 3]).is_err());
        assert!(net.set_support(&[-1.0; 6]).is_err());

        net.set_eta(0.1).unwrap();
        net.set_eps(1e-8).unwrap();
        net.set_rho(1e-4).unwrap();
        assert_eq!((net.eta(), net.eps(), net.rho()), (0.1, 1e-8, 1e-4));
    }
}
