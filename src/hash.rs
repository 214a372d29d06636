//! Chunk and full-story hashing
//!
//! Both hashes are Ethereum keccak256 (not NIST SHA3) and must match the
//! DeepFamily contract bit for bit:
//!
//! - `chunkHash = keccak256(utf8(content))`
//! - `fullStoryHash = keccak256(chunkHash[0] || chunkHash[1] || ...)` in
//!   ascending `chunkIndex` order, or the zero hash for an empty story

use crate::error::{CoreError, Result};
use crate::story::StoryChunk;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte hash, written as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The "no commitment yet" sentinel.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 64 {
            return Err(CoreError::InvalidHash(format!(
                "expected 64 hex chars, got {}",
                digits.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| CoreError::InvalidHash(format!("{}: {}", s, e)))?;
        Ok(Hash256(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl FromStr for Hash256 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Hash256::from_hex(s)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Ethereum keccak256 over raw bytes.
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

/// Hash of one chunk's content, as stored on-chain in `chunkHash`.
pub fn hash_chunk_content(content: &str) -> Hash256 {
    keccak256(content.as_bytes())
}

/// Full story hash over the chunks' stored hashes.
///
/// Sorts by `chunk_index` internally, so input order does not matter.
/// Duplicate indices are hashed as given.
pub fn compute_aggregate_hash(chunks: &[StoryChunk]) -> Hash256 {
    if chunks.is_empty() {
        return Hash256::ZERO;
    }

    let mut ordered: Vec<&StoryChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.chunk_index);

    let mut hasher = Keccak256::new();
    for chunk in ordered {
        hasher.update(chunk.chunk_hash.as_bytes());
    }
    Hash256(hasher.finalize().into())
}
