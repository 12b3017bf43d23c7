//! Crate-level error.

use crate::decode::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fsevent: invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
