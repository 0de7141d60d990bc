use std::collections::TryReserveError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A buffer or context length does not match the declared width.
    InvalidInput(String),
    /// Widths, hyperparameters or table structure are out of range.
    InvalidConfig(String),
    /// A numeric precondition was violated (e.g. ASGD step `t == 0`).
    NumericDegenerate(String),
    /// A buffer or table entry could not be reserved.
    AllocationFailure(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::NumericDegenerate(msg) => write!(f, "numeric degenerate: {msg}"),
            Error::AllocationFailure(msg) => write!(f, "allocation failure: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::AllocationFailure(err.to_string())
    }
}

/// Allocate a zeroed `f32` buffer, reporting failure instead of aborting.
pub(crate) fn try_zeros(len: usize) -> Result<Vec<f32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0.0);
    Ok(buf)
}
