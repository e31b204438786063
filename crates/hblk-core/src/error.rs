use std::collections::TryReserveError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid format: {0}")]
    FormatInvalid(String),

    #[error("truncated input: {what} needs {needed} bytes, {available} left")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("mining cancelled")]
    Cancelled,

    #[error("params error: {0}")]
    Params(#[from] serde_json::Error),
}

/// Reasons a block is rejected. Each check reports its own variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("block index {found} does not follow predecessor (expected {expected})")]
    IndexMismatch { expected: u32, found: u32 },

    #[error("block {index} does not reference its predecessor's hash")]
    LinkageBroken { index: u32 },

    #[error("block {index} hash does not match its contents")]
    HashMismatch { index: u32 },

    #[error("block {index} hash has {actual} leading zero bits, difficulty requires {required}")]
    DifficultyNotMet {
        index: u32,
        required: u32,
        actual: u32,
    },

    #[error("first block is not the genesis block")]
    GenesisMismatch,
}
