//! Story integrity verification
//!
//! Reconciles a fetched chunk set against the story's on-chain commitment.
//! The result is always a report, never an error: missing or corrupted
//! chunks are ordinary outcomes the frontend has to display.
//!
//! # Hash verdict
//!
//! The full story hash covers the complete ordered chunk set, so it can only
//! be checked once every index is present. A partial set yields
//! [`HashVerdict::NotEvaluable`] (`null` in JSON), which is not the same as
//! [`HashVerdict::Mismatch`] (`false`, evaluated and disagreed).

use crate::hash::{compute_aggregate_hash, Hash256};
use crate::story::{StoryChunk, StoryMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

// =============================================================================
// Verdicts
// =============================================================================

/// Outcome of comparing the recomputed full story hash with the commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum HashVerdict {
    /// Recomputed hash equals `fullStoryHash`
    Match,
    /// Recomputed hash differs from `fullStoryHash`
    Mismatch,
    /// Not enough data to evaluate (missing chunks, empty story, or no commitment)
    NotEvaluable,
}

impl From<Option<bool>> for HashVerdict {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => HashVerdict::Match,
            Some(false) => HashVerdict::Mismatch,
            None => HashVerdict::NotEvaluable,
        }
    }
}

impl From<HashVerdict> for Option<bool> {
    fn from(verdict: HashVerdict) -> Self {
        match verdict {
            HashVerdict::Match => Some(true),
            HashVerdict::Mismatch => Some(false),
            HashVerdict::NotEvaluable => None,
        }
    }
}

/// Display-level summary of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// Sealed, complete, lengths and hash agree
    Verified,
    /// Complete and consistent, still editable
    Intact,
    /// One or more chunks not fetched yet
    Incomplete,
    /// All chunks present but byte length disagrees with the commitment
    LengthMismatch,
    /// Hash disagrees with the commitment, or a chunk's content disagrees with its hash
    Tampered,
}

// =============================================================================
// Report
// =============================================================================

/// Result of [`verify`]. Rebuilt from scratch on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    /// Indices in `[0, totalChunks)` with no chunk, ascending
    pub missing_indices: Vec<u32>,
    pub length_match: bool,
    pub hash_match: HashVerdict,
    /// Sum of UTF-8 byte lengths of the chunks that are present
    pub computed_length: u64,
    /// Recomputed full story hash, present once the chunk set is complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_hash: Option<Hash256>,
    /// Chunks whose stored hash does not match their content
    #[serde(default)]
    pub mismatched_chunk_indices: Vec<u32>,
}

impl IntegrityReport {
    pub fn is_complete(&self) -> bool {
        self.missing_indices.is_empty()
    }

    /// Complete, lengths agree, hash matched, every chunk hash agrees.
    pub fn is_clean(&self) -> bool {
        self.is_complete()
            && self.length_match
            && self.hash_match == HashVerdict::Match
            && self.mismatched_chunk_indices.is_empty()
    }

    pub fn status(&self, metadata: &StoryMetadata) -> IntegrityStatus {
        if self.hash_match == HashVerdict::Mismatch || !self.mismatched_chunk_indices.is_empty() {
            return IntegrityStatus::Tampered;
        }
        if !self.is_complete() {
            return IntegrityStatus::Incomplete;
        }
        if !self.length_match {
            return IntegrityStatus::LengthMismatch;
        }
        if metadata.is_sealed && self.hash_match == HashVerdict::Match {
            IntegrityStatus::Verified
        } else {
            IntegrityStatus::Intact
        }
    }
}

// =============================================================================
// Verification
// =============================================================================

fn sorted(chunks: &[StoryChunk]) -> Vec<&StoryChunk> {
    let mut ordered: Vec<&StoryChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.chunk_index);
    ordered
}

/// Concatenate the contents of the present chunks in index order.
///
/// Best effort: gaps are skipped silently, so the text may be partial.
pub fn reconstruct_story(chunks: &[StoryChunk]) -> String {
    let ordered = sorted(chunks);
    let mut story = String::with_capacity(ordered.iter().map(|c| c.byte_len()).sum());
    for chunk in ordered {
        story.push_str(&chunk.content);
    }
    story
}

/// Reconcile fetched chunks against the story commitment.
pub fn verify(chunks: &[StoryChunk], metadata: &StoryMetadata) -> IntegrityReport {
    let ordered = sorted(chunks);

    let present: BTreeSet<u32> = ordered.iter().map(|c| c.chunk_index).collect();
    let missing_indices: Vec<u32> = (0..metadata.total_chunks)
        .filter(|i| !present.contains(i))
        .collect();

    let computed_length: u64 = ordered.iter().map(|c| c.byte_len() as u64).sum();
    let length_match = computed_length == metadata.total_length;

    let mismatched_chunk_indices: Vec<u32> = ordered
        .iter()
        .filter(|c| !c.hash_matches_content())
        .map(|c| c.chunk_index)
        .collect();
    if !mismatched_chunk_indices.is_empty() {
        warn!(
            indices = ?mismatched_chunk_indices,
            "chunk content does not match stored chunk hash"
        );
    }

    let complete = missing_indices.is_empty() && metadata.total_chunks > 0;
    let computed_hash = complete.then(|| compute_aggregate_hash(chunks));

    let hash_match = match computed_hash {
        Some(hash) if !metadata.full_story_hash.is_zero() => {
            if hash == metadata.full_story_hash {
                HashVerdict::Match
            } else {
                warn!(
                    computed = %hash,
                    expected = %metadata.full_story_hash,
                    "full story hash mismatch"
                );
                HashVerdict::Mismatch
            }
        }
        _ => HashVerdict::NotEvaluable,
    };

    debug!(
        total_chunks = metadata.total_chunks,
        present = present.len(),
        missing = missing_indices.len(),
        computed_length,
        length_match,
        hash_match = ?hash_match,
        "story verified"
    );

    IntegrityReport {
        missing_indices,
        length_match,
        hash_match,
        computed_length,
        computed_hash,
        mismatched_chunk_indices,
    }
}
