//! Lazily grown embedding tables.
//!
//! Each table maps a feature [`Key`] to its own [`Parameter`]. Rows are created on
//! first lookup and live for the lifetime of the table.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::{Error, Initializer, Parameter, Result};

/// Integer identifier of a discrete feature value.
pub type Key = u64;

/// Feature key -> learned vector, grown on demand.
///
/// Keys are never removed; a key seen for the first time gets a freshly
/// initialized [`Parameter`] of width `n_cols`.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    n_cols: usize,
    table: HashMap<Key, Parameter>,
    is_static: bool,
}

impl EmbeddingTable {
    pub fn new(n_cols: usize) -> Result<Self> {
        if n_cols == 0 {
            return Err(Error::InvalidConfig(
                "embedding width n_cols must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            n_cols,
            table: HashMap::new(),
            is_static: false,
        })
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Static tables are looked up but never updated.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    /// Lookup without creating.
    #[inline]
    pub fn get(&self, key: Key) -> Option<&Parameter> {
        self.table.get(&key)
    }

    /// Lookup, creating the entry from `init` on first use.
    ///
    /// Fails only when the table slot or the parameter buffers cannot be reserved;
    /// in that case the table is left unchanged.
    pub fn get_or_init(&mut self, key: Key, init: &mut dyn Initializer) -> Result<&mut Parameter> {
        self.table.try_reserve(1)?;

        match self.table.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let param = Parameter::try_new(self.n_cols, init)?;
                log::trace!("embedding table: new key {key} (n_cols={})", self.n_cols);
                Ok(entry.insert(param))
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.table.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &Parameter)> + '_ {
        self.table.iter().map(|(k, p)| (*k, p))
    }
}
