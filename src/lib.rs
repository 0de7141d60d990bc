//! A small feedforward network with a sparse embedding front end.
//!
//! `sparse-mlp` trains classifiers whose inputs are sets of discrete feature keys
//! ("atoms") rather than dense tensors. It has two parts with different parameter
//! models and update rules:
//!
//! - [`InputLayer`]: one [`EmbeddingTable`] per feature slot type. Tables map integer
//!   keys to learned vectors, create entries lazily on first use, and train each entry
//!   with averaged SGD with momentum ([`Parameter`]).
//! - [`NeuralNet`]: a dense MLP with a softmax output whose weights live in one flat
//!   buffer and are trained with Adagrad (plus optional L2).
//!
//! [`SparseModel`] wires the two together and owns the step counter used by the
//! averaging schedule.
//!
//! # Data layout
//!
//! - Scalars are `f32`; feature keys are [`Key`] (`u64`).
//! - `NeuralNet` weights: per transition a row-major `(out, in)` matrix followed by its
//!   `out` biases, transitions concatenated in layer order. `support` mirrors it.
//! - `InputLayer` output: the vectors of every configured context position, table by
//!   table, back to back.
//!
//! # Errors
//!
//! Public operations validate shapes at the boundary and return [`Result`]; a failed
//! call leaves weights, support and tables unchanged.
//!
//! # Quick start
//!
//! ```rust
//! use sparse_mlp::{Example, InputLayer, NetBuilder, SparseModel, TrainConfig, UniformInit};
//!
//! # fn main() -> sparse_mlp::Result<()> {
//! // Two slot types, four columns each, reading context positions 0 and 1.
//! let input = InputLayer::new(&[(4, vec![0]), (4, vec![1])], UniformInit::with_seed(0))?;
//! let net = NetBuilder::new(&[input.length(), 16, 3])?.build_with_seed(0)?;
//! let mut model = SparseModel::new(input, net, TrainConfig::default())?;
//!
//! let batch = vec![
//!     Example::with_gold(vec![17, 4], 3, 0)?,
//!     Example::with_gold(vec![23, 4], 3, 2)?,
//! ];
//! let _loss = model.train_batch(&batch)?;
//! let probs = model.predict(&[17, 4])?;
//! assert_eq!(probs.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! # Driving the network directly
//!
//! ```rust
//! use sparse_mlp::NeuralNet;
//!
//! # fn main() -> sparse_mlp::Result<()> {
//! let mut net = NeuralNet::new_with_seed(&[2, 3, 2], 0.005, 1e-6, 0.0, 0)?;
//! assert_eq!(net.predict(&[1.0, 0.0])?, vec![0.5, 0.5]);
//!
//! let loss = net.train(&[([1.0_f32, 0.0], [0.0_f32, 1.0])])?;
//! assert!((loss - 0.5).abs() < 1e-6);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod embed;
pub mod error;
pub mod init;
pub mod input;
pub mod loss;
pub mod model;
pub mod net;
pub mod param;
pub(crate) mod vecmath;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::Activation;
pub use builder::{Hyperparams, NetBuilder};
pub use embed::{EmbeddingTable, Key};
pub use error::{Error, Result};
pub use init::{Initializer, UniformInit};
pub use input::InputLayer;
pub use model::{Example, SparseModel, TrainConfig};
pub use net::{NeuralNet, Scratch};
pub use param::{Parameter, UpdateRule};
