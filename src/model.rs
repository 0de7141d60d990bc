//! Training loop pairing an [`InputLayer`] with a [`NeuralNet`].
//!
//! A training step for a minibatch:
//!
//! 1. `InputLayer::fill` (current vectors) for every example,
//! 2. `NeuralNet::train_with` (dense update + per-example input gradients),
//! 3. advance the step counter `t`,
//! 4. `InputLayer::update` with each example's input gradient at step `t`.
//!
//! The step counter is owned here rather than being global, so callers can read or
//! reset it for reproducible runs.

use crate::{Error, InputLayer, Key, NeuralNet, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Hyperparameters for the sparse input layer.
pub struct TrainConfig {
    /// Learning rate of the embedding ASGD update.
    pub embed_eta: f32,
    /// Momentum of the embedding ASGD update.
    pub mu: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            embed_eta: 0.005,
            mu: 0.2,
        }
    }
}

impl TrainConfig {
    pub fn validate(self) -> Result<()> {
        if !(self.embed_eta.is_finite() && self.embed_eta > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "embed_eta must be finite and > 0, got {}",
                self.embed_eta
            )));
        }
        if !(self.mu.is_finite() && (0.0..1.0).contains(&self.mu)) {
            return Err(Error::InvalidConfig(format!(
                "mu must be finite and in [0,1), got {}",
                self.mu
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One training example: feature keys plus a per-class cost vector.
pub struct Example {
    pub context: Vec<Key>,
    pub costs: Vec<f32>,
}

impl Example {
    pub fn new(context: Vec<Key>, costs: Vec<f32>) -> Self {
        Self { context, costs }
    }

    /// Costs of 1 everywhere except 0 at `gold`.
    pub fn with_gold(context: Vec<Key>, nr_class: usize, gold: usize) -> Result<Self> {
        if gold >= nr_class {
            return Err(Error::InvalidInput(format!(
                "gold class {gold} out of range for {nr_class} classes"
            )));
        }
        let mut costs = vec![1.0; nr_class];
        costs[gold] = 0.0;
        Ok(Self { context, costs })
    }
}

#[derive(Debug)]
pub struct SparseModel {
    input: InputLayer,
    net: NeuralNet,
    cfg: TrainConfig,
    t: u64,
}

impl SparseModel {
    pub fn new(input: InputLayer, net: NeuralNet, cfg: TrainConfig) -> Result<Self> {
        cfg.validate()?;
        if input.length() != net.nr_in() {
            return Err(Error::InvalidConfig(format!(
                "input layer length {} does not match net nr_in {}",
                input.length(),
                net.nr_in()
            )));
        }
        Ok(Self {
            input,
            net,
            cfg,
            t: 0,
        })
    }

    #[inline]
    pub fn input(&self) -> &InputLayer {
        &self.input
    }

    #[inline]
    pub fn input_mut(&mut self) -> &mut InputLayer {
        &mut self.input
    }

    #[inline]
    pub fn net(&self) -> &NeuralNet {
        &self.net
    }

    #[inline]
    pub fn net_mut(&mut self) -> &mut NeuralNet {
        &mut self.net
    }

    #[inline]
    pub fn config(&self) -> TrainConfig {
        self.cfg
    }

    /// Number of minibatches trained so far.
    #[inline]
    pub fn step(&self) -> u64 {
        self.t
    }

    #[inline]
    pub fn set_step(&mut self, t: u64) {
        self.t = t;
    }

    /// Train on one minibatch and return the summed cost-mass loss.
    pub fn train_batch(&mut self, batch: &[Example]) -> Result<f32> {
        if batch.is_empty() {
            return Err(Error::InvalidInput("batch must not be empty".to_owned()));
        }
        for (idx, ex) in batch.iter().enumerate() {
            self.input.check_context(&ex.context)?;
            if ex.costs.len() != self.net.nr_out() {
                return Err(Error::InvalidInput(format!(
                    "example {idx}: costs len {} does not match nr_out {}",
                    ex.costs.len(),
                    self.net.nr_out()
                )));
            }
        }

        let width = self.input.length();
        let mut inputs = vec![0.0_f32; batch.len() * width];
        for (row, ex) in inputs.chunks_exact_mut(width).zip(batch) {
            self.input.fill(row, &ex.context, false)?;
        }

        let pairs: Vec<(&[f32], &[f32])> = inputs
            .chunks_exact(width)
            .zip(batch)
            .map(|(row, ex)| (row, ex.costs.as_slice()))
            .collect();

        let mut d_inputs = vec![0.0_f32; batch.len() * width];
        let loss = self.net.train_with(&pairs, |idx, d| {
            d_inputs[idx * width..(idx + 1) * width].copy_from_slice(d);
        })?;

        self.t += 1;
        for (grad, ex) in d_inputs.chunks_exact(width).zip(batch) {
            self.input
                .update(grad, &ex.context, self.t, self.cfg.embed_eta, self.cfg.mu)?;
        }

        log::debug!(
            "train_batch: step={} batch={} loss={loss}",
            self.t,
            batch.len()
        );
        Ok(loss)
    }

    /// Class distribution for `context`, computed from averaged embeddings.
    pub fn predict(&mut self, context: &[Key]) -> Result<Vec<f32>> {
        let mut input = vec![0.0_f32; self.input.length()];
        self.input.fill(&mut input, context, true)?;
        self.net.predict(&input)
    }

    /// Index of the most probable class.
    pub fn predict_class(&mut self, context: &[Key]) -> Result<usize> {
        let probs = self.predict(context)?;
        let mut best = 0;
        for (i, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = i;
            }
        }
        Ok(best)
    }
}
