//! Network snapshots (feature: `serde`).
//!
//! A versioned JSON format for `NeuralNet`, kept separate from the in-memory struct so
//! the file layout does not change when internals do. Loading validates widths,
//! hyperparameters, buffer lengths and finiteness.
//!
//! Embedding tables are not part of the snapshot.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Activation, Error, NeuralNet, Result};

pub const NET_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNet {
    pub format_version: u32,
    pub widths: Vec<usize>,
    pub hidden: Activation,
    pub eta: f32,
    pub eps: f32,
    pub rho: f32,
    /// Flat parameter buffer, per transition: row-major weights then biases.
    pub weights: Vec<f32>,
    pub support: Vec<f32>,
}

impl From<&NeuralNet> for SerializedNet {
    fn from(net: &NeuralNet) -> Self {
        Self {
            format_version: NET_FORMAT_VERSION,
            widths: net.widths().to_vec(),
            hidden: net.hidden_activation(),
            eta: net.eta(),
            eps: net.eps(),
            rho: net.rho(),
            weights: net.weights().to_vec(),
            support: net.support().to_vec(),
        }
    }
}

impl TryFrom<SerializedNet> for NeuralNet {
    type Error = Error;

    fn try_from(value: SerializedNet) -> std::result::Result<Self, Self::Error> {
        if value.format_version != NET_FORMAT_VERSION {
            return Err(Error::InvalidInput(format!(
                "unsupported net format_version {}; expected {}",
                value.format_version, NET_FORMAT_VERSION
            )));
        }
        NeuralNet::from_parts(
            &value.widths,
            value.hidden,
            value.eta,
            value.eps,
            value.rho,
            value.weights,
            value.support,
        )
    }
}

impl NeuralNet {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&SerializedNet::from(self))
            .map_err(|e| Error::InvalidInput(format!("failed to serialize net: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNet = serde_json::from_str(s)
            .map_err(|e| Error::InvalidInput(format!("failed to parse net json: {e}")))?;
        ser.try_into()
    }

    /// Save as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        let s = serde_json::to_string_pretty(&SerializedNet::from(self))
            .map_err(|e| Error::InvalidInput(format!("failed to serialize net: {e}")))?;
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidInput(format!("failed to write {}: {e}", p.display())))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidInput(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trained_net_survives_json() {
        let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 0.05, 1e-6, 1e-4, 0).unwrap();
        net.train(&[([1.0_f32, 0.0], [0.0_f32, 1.0])]).unwrap();

        let json = net.to_json_string().unwrap();
        let loaded = NeuralNet::from_json_str(&json).unwrap();
        assert_eq!(loaded.widths(), net.widths());
        assert_eq!(loaded.weights(), net.weights());
        assert_eq!(loaded.support(), net.support());
        assert_eq!(loaded.rho(), net.rho());
        assert_eq!(
            loaded.predict(&[0.2, 0.7]).unwrap(),
            net.predict(&[0.2, 0.7]).unwrap()
        );
    }

    #[test]
    fn rejects_unknown_version_and_bad_lengths() {
        let net = NeuralNet::new_with_seed(&[2, 2], 0.05, 1e-6, 0.0, 0).unwrap();
        let mut ser = SerializedNet::from(&net);

        ser.format_version = 999;
        let err = NeuralNet::try_from(ser.clone()).unwrap_err();
        assert!(format!("{err}").contains("format_version"));

        ser.format_version = NET_FORMAT_VERSION;
        ser.weights.pop();
        assert!(NeuralNet::try_from(ser).is_err());
    }
}
