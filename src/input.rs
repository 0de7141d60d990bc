//! Sparse-to-dense input assembly.
//!
//! An [`InputLayer`] owns one [`EmbeddingTable`] per feature slot type. Each table is
//! paired with the list of context positions whose keys it embeds:
//!
//! ```text
//! tables[0] <- context[indices[0][0]], context[indices[0][1]], ...
//! tables[1] <- context[indices[1][0]], ...
//! ```
//!
//! `fill` writes the looked-up vectors back to back into one dense buffer of width
//! `length()`; `update` walks the same order and hands each slice of the incoming
//! gradient to the parameter it came from.

use std::fmt;

use crate::{EmbeddingTable, Error, Initializer, Key, Result};

pub struct InputLayer {
    tables: Vec<EmbeddingTable>,
    indices: Vec<Vec<usize>>,
    length: usize,
    min_context: usize,
    init: Box<dyn Initializer>,
}

impl fmt::Debug for InputLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputLayer")
            .field("tables", &self.tables)
            .field("indices", &self.indices)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl InputLayer {
    /// Build from `(n_cols, context_positions)` pairs, one per table.
    pub fn new<I>(structure: &[(usize, Vec<usize>)], init: I) -> Result<Self>
    where
        I: Initializer + 'static,
    {
        if structure.is_empty() {
            return Err(Error::InvalidConfig(
                "input layer needs at least one table".to_owned(),
            ));
        }

        let mut tables = Vec::with_capacity(structure.len());
        let mut indices = Vec::with_capacity(structure.len());
        let mut length = 0_usize;
        let mut min_context = 0_usize;

        for (i, (n_cols, positions)) in structure.iter().enumerate() {
            if positions.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "table {i} does not consume any context position"
                )));
            }
            tables.push(EmbeddingTable::new(*n_cols)?);

            length = n_cols
                .checked_mul(positions.len())
                .and_then(|w| length.checked_add(w))
                .ok_or_else(|| Error::InvalidConfig("input layer width overflow".to_owned()))?;
            if let Some(&max_pos) = positions.iter().max() {
                let needed = max_pos.checked_add(1).ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "table {i}: context position {max_pos} is too large"
                    ))
                })?;
                min_context = min_context.max(needed);
            }
            indices.push(positions.clone());
        }

        log::info!(
            "input layer: {} tables, length={length}, context>={min_context}",
            tables.len()
        );

        Ok(Self {
            tables,
            indices,
            length,
            min_context,
            init: Box::new(init),
        })
    }

    /// Total width of the assembled dense vector.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Minimum context length accepted by `fill` / `update`.
    #[inline]
    pub fn min_context(&self) -> usize {
        self.min_context
    }

    #[inline]
    pub fn nr_table(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn table(&self, idx: usize) -> Option<&EmbeddingTable> {
        self.tables.get(idx)
    }

    #[inline]
    pub fn table_mut(&mut self, idx: usize) -> Option<&mut EmbeddingTable> {
        self.tables.get_mut(idx)
    }

    #[inline]
    pub fn indices(&self, idx: usize) -> Option<&[usize]> {
        self.indices.get(idx).map(Vec::as_slice)
    }

    /// Validate a context against the configured positions.
    pub fn check_context(&self, context: &[Key]) -> Result<()> {
        if context.len() < self.min_context {
            return Err(Error::InvalidInput(format!(
                "context len {} is shorter than required {}",
                context.len(),
                self.min_context
            )));
        }
        Ok(())
    }

    /// Write the embedding of every configured context position into `output`.
    ///
    /// Unseen keys are created on the fly. `use_avg` selects the averaged vectors
    /// (prediction) instead of the current ones (training).
    pub fn fill(&mut self, output: &mut [f32], context: &[Key], use_avg: bool) -> Result<()> {
        if output.len() != self.length {
            return Err(Error::InvalidInput(format!(
                "output len {} does not match input layer length {}",
                output.len(),
                self.length
            )));
        }
        self.check_context(context)?;

        let mut cursor = 0;
        for (table, positions) in self.tables.iter_mut().zip(&self.indices) {
            let n_cols = table.n_cols();
            for &pos in positions {
                let param = table.get_or_init(context[pos], &mut *self.init)?;
                output[cursor..cursor + n_cols].copy_from_slice(param.values(use_avg));
                cursor += n_cols;
            }
        }
        debug_assert_eq!(cursor, self.length);
        Ok(())
    }

    /// Route `gradient` (same layout as `fill`'s output) into the per-key parameters.
    ///
    /// `context` must be the one used for the matching `fill`. Shape and step checks
    /// happen before any parameter is touched.
    pub fn update(
        &mut self,
        gradient: &[f32],
        context: &[Key],
        t: u64,
        eta: f32,
        mu: f32,
    ) -> Result<()> {
        if gradient.len() != self.length {
            return Err(Error::InvalidInput(format!(
                "gradient len {} does not match input layer length {}",
                gradient.len(),
                self.length
            )));
        }
        self.check_context(context)?;
        if t == 0 {
            return Err(Error::NumericDegenerate(
                "update step t must be >= 1".to_owned(),
            ));
        }

        let mut cursor = 0;
        for (table, positions) in self.tables.iter_mut().zip(&self.indices) {
            let n_cols = table.n_cols();
            if table.is_static() {
                cursor += n_cols * positions.len();
                continue;
            }
            for &pos in positions {
                let param = table.get_or_init(context[pos], &mut *self.init)?;
                param.update(&gradient[cursor..cursor + n_cols], t, eta, mu)?;
                cursor += n_cols;
            }
        }
        debug_assert_eq!(cursor, self.length);
        Ok(())
    }
}
