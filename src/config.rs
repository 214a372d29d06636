//! Configuration for DeepFamily core

use crate::content_id::{CidGenerator, CidMethod};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contract cap on a single chunk's content, in UTF-8 bytes
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1000;

/// Contract cap on chunks per story
pub const DEFAULT_MAX_CHUNKS: u32 = 100;

/// Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Encoder behind [`CoreConfig::generate_cid`]
    #[serde(default)]
    pub cid_method: CidMethod,

    /// Maximum chunk content length in UTF-8 bytes
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,

    /// Maximum number of chunks per story
    #[serde(default = "default_max_chunks")]
    pub max_chunks: u32,

    /// How long a verified snapshot of a sealed story stays fresh
    #[serde(default = "default_sealed_ttl")]
    pub sealed_ttl_ms: u64,

    /// How long a verified snapshot of an editable story stays fresh
    #[serde(default = "default_unsealed_ttl")]
    pub unsealed_ttl_ms: u64,

    /// Story cache capacity, counted in chunk content bytes
    #[serde(default = "default_cache_max_bytes")]
    pub cache_max_bytes: u64,
}

fn default_max_chunk_bytes() -> usize {
    DEFAULT_MAX_CHUNK_BYTES
}

fn default_max_chunks() -> u32 {
    DEFAULT_MAX_CHUNKS
}

fn default_sealed_ttl() -> u64 {
    7 * 24 * 60 * 60 * 1000 // 7 days
}

fn default_unsealed_ttl() -> u64 {
    5 * 60 * 1000 // 5 minutes
}

fn default_cache_max_bytes() -> u64 {
    8 * 1024 * 1024
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cid_method: CidMethod::default(),
            max_chunk_bytes: default_max_chunk_bytes(),
            max_chunks: default_max_chunks(),
            sealed_ttl_ms: default_sealed_ttl(),
            unsealed_ttl_ms: default_unsealed_ttl(),
            cache_max_bytes: default_cache_max_bytes(),
        }
    }
}

impl CoreConfig {
    /// Parse config from a TOML string. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Write limits enforced by the contract
    pub fn limits(&self) -> ChunkLimits {
        ChunkLimits {
            max_chunk_bytes: self.max_chunk_bytes,
            max_chunks: self.max_chunks,
        }
    }

    /// CID encoder selected by `cid_method`
    pub fn cid_generator(&self) -> &'static dyn CidGenerator {
        self.cid_method.generator()
    }

    /// CID of a metadata document using the configured encoder
    pub fn generate_cid(&self, document: &str) -> String {
        self.cid_generator().generate(document)
    }
}

/// Contract write limits mirrored for local pre-validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub max_chunk_bytes: usize,
    pub max_chunks: u32,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        CoreConfig::default().limits()
    }
}
