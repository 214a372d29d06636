//! DeepFamily Core - content identifiers and story integrity verification
//!
//! Pure computation shared by the DeepFamily frontend and any native tooling.
//! Compiled to WebAssembly for the browser, native for tests and scripts.
//!
//! - [`content_id`] - CIDv1 (raw, sha2-256) generation for metadata documents, with a
//!   self-hosted encoder and a reference-crate encoder that must agree
//! - [`hash`] - keccak256 chunk hashes and the aggregate `fullStoryHash`
//!   exactly as the DeepFamily contract computes them
//! - [`integrity`] - rebuilds a story from fetched chunks and reconciles it
//!   against the on-chain commitment
//! - [`validation`] - local pre-checks that mirror the contract's write rules
//! - [`cache`] - staleness policy for verified story snapshots
//!
//! # Example
//!
//! ```rust
//! use deepfamily_core::{generate_cid, hash_chunk_content, verify, StoryChunk, StoryMetadata};
//!
//! let cid = generate_cid(r#"{"schema":"x","tag":"v1"}"#);
//! assert!(cid.starts_with("bafkrei"));
//!
//! let chunks = vec![
//!     StoryChunk::new(0, "Born in Lyon."),
//!     StoryChunk::new(1, "Moved to Paris."),
//! ];
//! let metadata = StoryMetadata::from_chunks(&chunks, true, 0);
//!
//! let report = verify(&chunks, &metadata);
//! assert!(report.is_clean());
//! assert_eq!(chunks[0].chunk_hash, hash_chunk_content("Born in Lyon."));
//! ```

pub mod cache;
pub mod config;
pub mod content_id;
pub mod error;
pub mod hash;
pub mod integrity;
pub mod story;
pub mod validation;
pub mod wasm;

pub use cache::{CacheStats, StoryCache, StorySnapshot};
pub use content_id::{
    content_matches_cid, generate_cid, generate_cid_reference, generate_cid_with, metadata_cid,
    parse_cid_digest, verify_consistency, CidGenerator, CidMethod, ConsistencyReport,
    ManualCidGenerator, ReferenceCidGenerator,
};
pub use config::{ChunkLimits, CoreConfig};
pub use error::{CoreError, Result};
pub use hash::{compute_aggregate_hash, hash_chunk_content, keccak256, Hash256};
pub use integrity::{reconstruct_story, verify, HashVerdict, IntegrityReport, IntegrityStatus};
pub use story::{ChunkType, StoryChunk, StoryMetadata};
pub use validation::{
    check_sealable, prepare_append, prepare_update, validate_chunk_content, ChunkSubmission,
};

// ============================================================================
// Time Utility
// ============================================================================

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn current_time_ms() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
