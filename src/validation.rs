//! Local pre-checks for story writes
//!
//! The contract enforces these rules on-chain; checking them first lets the
//! frontend refuse a transaction that would revert and waste gas. Lengths
//! are UTF-8 byte lengths, never character counts.

use crate::config::ChunkLimits;
use crate::content_id::parse_cid_digest;
use crate::error::{CoreError, Result};
use crate::hash::{hash_chunk_content, Hash256};
use crate::story::{ChunkType, StoryMetadata};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Arguments for an `addStoryChunk` / `updateStoryChunk` call, pre-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSubmission {
    pub chunk_index: u32,
    /// Passed as the contract's `expectedHash` guard
    pub expected_hash: Hash256,
    pub byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<ChunkType>,
    #[serde(
        default,
        rename = "attachmentCID",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment_cid: Option<String>,
}

/// Content must be non-empty and within the byte cap.
pub fn validate_chunk_content(content: &str, limits: &ChunkLimits) -> Result<()> {
    if content.is_empty() {
        return Err(CoreError::EmptyContent);
    }
    let len = content.len();
    if len > limits.max_chunk_bytes {
        return Err(CoreError::ContentTooLong {
            len,
            max: limits.max_chunk_bytes,
        });
    }
    Ok(())
}

fn ensure_editable(metadata: &StoryMetadata) -> Result<()> {
    if metadata.is_sealed {
        return Err(CoreError::StorySealed);
    }
    Ok(())
}

fn validate_attachment(attachment_cid: Option<&str>) -> Result<Option<String>> {
    match attachment_cid.map(str::trim).filter(|s| !s.is_empty()) {
        Some(cid) => {
            parse_cid_digest(cid)?;
            Ok(Some(cid.to_string()))
        }
        None => Ok(None),
    }
}

fn submission(
    chunk_index: u32,
    content: &str,
    chunk_type: Option<ChunkType>,
    attachment_cid: Option<String>,
) -> ChunkSubmission {
    ChunkSubmission {
        chunk_index,
        expected_hash: hash_chunk_content(content),
        byte_length: content.len(),
        chunk_type,
        attachment_cid,
    }
}

/// Check and prepare appending the next chunk.
///
/// Chunks are append-only: the new index is always `total_chunks`.
pub fn prepare_append(
    metadata: &StoryMetadata,
    content: &str,
    chunk_type: Option<ChunkType>,
    attachment_cid: Option<&str>,
    limits: &ChunkLimits,
) -> Result<ChunkSubmission> {
    ensure_editable(metadata)?;
    if metadata.total_chunks >= limits.max_chunks {
        return Err(CoreError::TooManyChunks {
            max: limits.max_chunks,
        });
    }
    validate_chunk_content(content, limits)?;
    let attachment_cid = validate_attachment(attachment_cid)?;

    debug!(
        chunk_index = metadata.total_chunks,
        bytes = content.len(),
        "append validated"
    );
    Ok(submission(metadata.total_chunks, content, chunk_type, attachment_cid))
}

/// Check and prepare replacing an existing chunk.
pub fn prepare_update(
    metadata: &StoryMetadata,
    chunk_index: u32,
    content: &str,
    chunk_type: Option<ChunkType>,
    attachment_cid: Option<&str>,
    limits: &ChunkLimits,
) -> Result<ChunkSubmission> {
    ensure_editable(metadata)?;
    if chunk_index >= metadata.total_chunks {
        return Err(CoreError::ChunkIndexOutOfRange {
            index: chunk_index,
            total: metadata.total_chunks,
        });
    }
    validate_chunk_content(content, limits)?;
    let attachment_cid = validate_attachment(attachment_cid)?;

    Ok(submission(chunk_index, content, chunk_type, attachment_cid))
}

/// A story can be sealed once, and only with at least one chunk.
pub fn check_sealable(metadata: &StoryMetadata) -> Result<()> {
    ensure_editable(metadata)?;
    if metadata.is_empty() {
        return Err(CoreError::NothingToSeal);
    }
    Ok(())
}
