//! Error types for songtide

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SongtideError {
    #[error("Invalid BPM: {0}")]
    InvalidBpm(f64),
    #[error("Invalid time signature: {0}/{1}")]
    InvalidSignature(u32, u32),
    #[error("Monster not found: {0}")]
    MonsterNotFound(u64),
    #[error("Plugin parameter {1} not found on monster {0}")]
    ParameterNotFound(u64, usize),
}

pub type Result<T> = std::result::Result<T, SongtideError>;
