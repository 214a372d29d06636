//! Story records as returned by the DeepFamily contract
//!
//! Field names serialize in camelCase so contract call results can be passed
//! through from the frontend unchanged.

use crate::hash::{compute_aggregate_hash, hash_chunk_content, Hash256};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

// =============================================================================
// Chunk Type
// =============================================================================

/// Content tag carried by a chunk. Not part of any hash.
///
/// Equality and hashing go through the `u8` code, so `Other(2)` is the same
/// tag as `Quote`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChunkType {
    /// Biographical prose
    Narrative,
    /// A work, publication or achievement
    Work,
    /// A quotation attributed to the person
    Quote,
    /// Photo, audio or video described by an attachment
    Media,
    /// Source citation
    Reference,
    /// Any code this client does not know (5 and up), kept as-is
    Other(u8),
}

impl PartialEq for ChunkType {
    fn eq(&self, other: &Self) -> bool {
        u8::from(*self) == u8::from(*other)
    }
}

impl Eq for ChunkType {}

impl Hash for ChunkType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        u8::from(*self).hash(state);
    }
}

impl Default for ChunkType {
    fn default() -> Self {
        ChunkType::Narrative
    }
}

impl From<u8> for ChunkType {
    fn from(code: u8) -> Self {
        match code {
            0 => ChunkType::Narrative,
            1 => ChunkType::Work,
            2 => ChunkType::Quote,
            3 => ChunkType::Media,
            4 => ChunkType::Reference,
            other => ChunkType::Other(other),
        }
    }
}

impl From<ChunkType> for u8 {
    fn from(kind: ChunkType) -> Self {
        match kind {
            ChunkType::Narrative => 0,
            ChunkType::Work => 1,
            ChunkType::Quote => 2,
            ChunkType::Media => 3,
            ChunkType::Reference => 4,
            ChunkType::Other(code) => code,
        }
    }
}

// =============================================================================
// Story Chunk
// =============================================================================

/// One on-chain fragment of a person's biography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryChunk {
    /// Position in the story, dense from 0 when complete
    pub chunk_index: u32,
    /// Human-readable fragment
    pub content: String,
    /// keccak256 of `content`, as computed by the contract at write time
    pub chunk_hash: Hash256,
    /// Write time (seconds, as reported by the chain)
    #[serde(default)]
    pub timestamp: u64,
    /// Address of the last editor
    #[serde(default, alias = "editor")]
    pub last_editor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<ChunkType>,
    /// CID of an external blob attached to this chunk
    #[serde(
        default,
        rename = "attachmentCID",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment_cid: Option<String>,
}

impl StoryChunk {
    /// Build a chunk with its hash computed locally.
    pub fn new(chunk_index: u32, content: impl Into<String>) -> Self {
        let content = content.into();
        let chunk_hash = hash_chunk_content(&content);
        Self {
            chunk_index,
            content,
            chunk_hash,
            timestamp: 0,
            last_editor: String::new(),
            chunk_type: None,
            attachment_cid: None,
        }
    }

    /// UTF-8 byte length of the content, the unit the contract measures in.
    pub fn byte_len(&self) -> usize {
        self.content.len()
    }

    /// Whether the stored hash matches the content.
    pub fn hash_matches_content(&self) -> bool {
        self.chunk_hash == hash_chunk_content(&self.content)
    }
}

// =============================================================================
// Story Metadata
// =============================================================================

/// On-chain commitment record for a story.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    pub total_chunks: u32,
    /// Sum of chunk content lengths in UTF-8 bytes
    pub total_length: u64,
    pub is_sealed: bool,
    /// Aggregate commitment; zero until the first chunk is written
    pub full_story_hash: Hash256,
    #[serde(default)]
    pub last_update_time: u64,
}

impl StoryMetadata {
    /// The commitment the contract records for this exact chunk set.
    pub fn from_chunks(chunks: &[StoryChunk], is_sealed: bool, last_update_time: u64) -> Self {
        Self {
            total_chunks: chunk_count(chunks.len()),
            total_length: chunks.iter().map(|c| c.byte_len() as u64).sum(),
            is_sealed,
            full_story_hash: compute_aggregate_hash(chunks),
            last_update_time,
        }
    }

    /// True when no chunk has been written yet.
    pub fn is_empty(&self) -> bool {
        self.total_chunks == 0
    }
}

/// Chunk count as the contract's `u32`, saturating.
fn chunk_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_json_matches_contract_shape() {
        let json = r#"{
            "chunkIndex": 2,
            "content": "hello",
            "chunkHash": "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8",
            "timestamp": 1700000000,
            "editor": "0xabc",
            "chunkType": 2,
            "attachmentCID": "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku"
        }"#;

        let chunk: StoryChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.chunk_index, 2);
        assert_eq!(chunk.last_editor, "0xabc");
        assert_eq!(chunk.chunk_type, Some(ChunkType::Quote));
        assert!(chunk.attachment_cid.is_some());
        assert!(chunk.hash_matches_content());

        let out = serde_json::to_value(&chunk).unwrap();
        assert_eq!(out["lastEditor"], "0xabc");
        assert_eq!(out["chunkType"], 2);
    }

    #[test]
    fn test_unknown_chunk_type_preserved() {
        let kind: ChunkType = serde_json::from_str("42").unwrap();
        assert_eq!(kind, ChunkType::Other(42));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "42");
    }

    #[test]
    fn test_other_with_known_code_equals_named() {
        use std::collections::HashSet;

        assert_eq!(ChunkType::Other(2), ChunkType::Quote);
        assert_ne!(ChunkType::Other(7), ChunkType::Quote);

        let kind = ChunkType::Other(2);
        let back: ChunkType =
            serde_json::from_str(&serde_json::to_string(&kind).unwrap()).unwrap();
        assert_eq!(back, kind);

        let tags: HashSet<ChunkType> = [ChunkType::Media, ChunkType::Other(3)].into();
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_byte_len_is_utf8() {
        let chunk = StoryChunk::new(0, "où");
        assert_eq!(chunk.content.chars().count(), 2);
        assert_eq!(chunk.byte_len(), 3);
    }

    #[test]
    fn test_metadata_from_chunks() {
        let chunks = vec![StoryChunk::new(0, "abc"), StoryChunk::new(1, "é")];
        let metadata = StoryMetadata::from_chunks(&chunks, false, 10);

        assert_eq!(metadata.total_chunks, 2);
        assert_eq!(metadata.total_length, 5);
        assert!(!metadata.is_sealed);
        assert!(!metadata.full_story_hash.is_zero());

        let empty = StoryMetadata::from_chunks(&[], false, 0);
        assert!(empty.is_empty());
        assert!(empty.full_story_hash.is_zero());
    }

    #[test]
    fn test_chunk_count_saturates() {
        assert_eq!(chunk_count(3), 3);
        assert_eq!(chunk_count(u32::MAX as usize), u32::MAX);
        assert_eq!(chunk_count(usize::MAX), u32::MAX);
    }
}
