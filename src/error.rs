//! Error types for DeepFamily core

use thiserror::Error;

/// Core error
///
/// Integrity problems (missing chunks, hash mismatches) are never errors;
/// they are reported through [`crate::IntegrityReport`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input violated the type contract (e.g. a non-string document from JS)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Hex string is not a 32-byte hash
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    /// String could not be parsed as a supported CID
    #[error("Invalid CID: {0}")]
    InvalidCid(String),

    /// Chunk content is empty
    #[error("Chunk content is empty")]
    EmptyContent,

    /// Chunk content exceeds the contract's byte cap
    #[error("Chunk content is {len} bytes, max is {max}")]
    ContentTooLong { len: usize, max: usize },

    /// Story has been sealed and can no longer change
    #[error("Story is sealed")]
    StorySealed,

    /// Story already holds the maximum number of chunks
    #[error("Story already has the maximum of {max} chunks")]
    TooManyChunks { max: u32 },

    /// Chunk index does not refer to an existing chunk
    #[error("Chunk index {index} out of range (story has {total} chunks)")]
    ChunkIndexOutOfRange { index: u32, total: u32 },

    /// Sealing requires at least one chunk
    #[error("Cannot seal an empty story")]
    NothingToSeal,

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse failed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
