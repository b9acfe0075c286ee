use std::result::Result as StdResult;

use thiserror::Error;

/// Errors produced while decoding or interpreting dream data.
#[derive(Error, Debug)]
pub enum DreamError {
    #[error("Malformed dream payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown dream category: {0}")]
    UnknownCategory(String),
}

pub type Result<T> = StdResult<T, DreamError>;
