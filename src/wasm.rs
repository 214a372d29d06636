//! WebAssembly bindings for the DeepFamily frontend
//!
//! Structured values cross the boundary as JSON strings in the contract's
//! camelCase shape; errors surface as JS exceptions.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { generateCID, verifyStory, StoryCacheHandle } from 'deepfamily-core';
//!
//! const cid = generateCID(JSON.stringify(versionMetadata));
//! const refCid = generateCID(doc, JSON.stringify({ cid_method: 'reference' }));
//!
//! // chunks / metadata straight from getStoryChunk / getStoryMetadata
//! const report = JSON.parse(verifyStory(JSON.stringify(chunks), JSON.stringify(metadata)));
//! if (report.hashMatch === false) showTamperWarning();
//! if (report.hashMatch === null) refetchMissing(report.missingIndices);
//!
//! const cache = new StoryCacheHandle(JSON.stringify({ sealed_ttl_ms: 86400000 }));
//! cache.put(tokenId, JSON.stringify(chunks), JSON.stringify(metadata));
//! ```

use crate::cache::StoryCache;
use crate::config::CoreConfig;
use crate::content_id::{generate_cid_reference, verify_consistency};
use crate::current_time_ms;
use crate::error::{CoreError, Result};
use crate::hash::{compute_aggregate_hash, hash_chunk_content};
use crate::integrity::{reconstruct_story, verify};
use crate::story::{ChunkType, StoryChunk, StoryMetadata};
use crate::validation::prepare_append;
use wasm_bindgen::prelude::*;

fn to_js(e: CoreError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Anything but a JS string is rejected up front.
fn document_string(document: &JsValue) -> Result<String> {
    document
        .as_string()
        .ok_or_else(|| CoreError::InvalidInput("document must be a string".to_string()))
}

fn parse_config(config_json: Option<&str>) -> Result<CoreConfig> {
    match config_json {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(json)?),
        _ => Ok(CoreConfig::default()),
    }
}

fn parse_chunks(chunks_json: &str) -> Result<Vec<StoryChunk>> {
    Ok(serde_json::from_str(chunks_json)?)
}

fn parse_metadata(metadata_json: &str) -> Result<StoryMetadata> {
    Ok(serde_json::from_str(metadata_json)?)
}

// =============================================================================
// JSON-level operations (native-testable)
// =============================================================================

pub(crate) fn cid_for(document: &str, config_json: Option<&str>) -> Result<String> {
    Ok(parse_config(config_json)?.generate_cid(document))
}

pub(crate) fn verify_story_json(chunks_json: &str, metadata_json: &str) -> Result<String> {
    let chunks = parse_chunks(chunks_json)?;
    let metadata = parse_metadata(metadata_json)?;
    Ok(serde_json::to_string(&verify(&chunks, &metadata))?)
}

pub(crate) fn aggregate_hash_json(chunks_json: &str) -> Result<String> {
    let chunks = parse_chunks(chunks_json)?;
    Ok(compute_aggregate_hash(&chunks).to_hex())
}

pub(crate) fn reconstruct_story_json(chunks_json: &str) -> Result<String> {
    Ok(reconstruct_story(&parse_chunks(chunks_json)?))
}

pub(crate) fn prepare_append_json(
    metadata_json: &str,
    content: &str,
    chunk_type: Option<u8>,
    attachment_cid: Option<&str>,
    config_json: Option<&str>,
) -> Result<String> {
    let metadata = parse_metadata(metadata_json)?;
    let limits = parse_config(config_json)?.limits();
    let submission = prepare_append(
        &metadata,
        content,
        chunk_type.map(ChunkType::from),
        attachment_cid,
        &limits,
    )?;
    Ok(serde_json::to_string(&submission)?)
}

// =============================================================================
// Exports
// =============================================================================

/// CID of a metadata document, using the encoder named by the optional
/// config JSON's `cid_method` ("manual" unless set).
#[wasm_bindgen(js_name = generateCID)]
pub fn generate_cid_js(
    document: JsValue,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    let document = document_string(&document).map_err(to_js)?;
    cid_for(&document, config_json.as_deref()).map_err(to_js)
}

/// CID via the reference encoder, as a Promise.
#[wasm_bindgen(js_name = generateCIDReference)]
pub async fn generate_cid_reference_js(document: JsValue) -> std::result::Result<String, JsValue> {
    let document = document_string(&document).map_err(to_js)?;
    Ok(generate_cid_reference(&document).await)
}

/// `{ consistent, own, reference }` as JSON.
#[wasm_bindgen(js_name = verifyConsistency)]
pub fn verify_consistency_js(document: JsValue) -> std::result::Result<String, JsValue> {
    let document = document_string(&document).map_err(to_js)?;
    serde_json::to_string(&verify_consistency(&document)).map_err(|e| to_js(e.into()))
}

/// `0x`-prefixed keccak256 of the content's UTF-8 bytes.
#[wasm_bindgen(js_name = hashChunkContent)]
pub fn hash_chunk_content_js(content: JsValue) -> std::result::Result<String, JsValue> {
    let content = content
        .as_string()
        .ok_or_else(|| to_js(CoreError::InvalidInput("content must be a string".to_string())))?;
    Ok(hash_chunk_content(&content).to_hex())
}

#[wasm_bindgen(js_name = computeAggregateHash)]
pub fn compute_aggregate_hash_js(chunks_json: &str) -> std::result::Result<String, JsValue> {
    aggregate_hash_json(chunks_json).map_err(to_js)
}

/// Integrity report JSON for a chunk set and its metadata.
#[wasm_bindgen(js_name = verifyStory)]
pub fn verify_story_js(
    chunks_json: &str,
    metadata_json: &str,
) -> std::result::Result<String, JsValue> {
    verify_story_json(chunks_json, metadata_json).map_err(to_js)
}

#[wasm_bindgen(js_name = reconstructStory)]
pub fn reconstruct_story_js(chunks_json: &str) -> std::result::Result<String, JsValue> {
    reconstruct_story_json(chunks_json).map_err(to_js)
}

/// Pre-check an `addStoryChunk` call; returns the submission JSON.
#[wasm_bindgen(js_name = prepareAppend)]
pub fn prepare_append_js(
    metadata_json: &str,
    content: &str,
    chunk_type: Option<u8>,
    attachment_cid: Option<String>,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    prepare_append_json(
        metadata_json,
        content,
        chunk_type,
        attachment_cid.as_deref(),
        config_json.as_deref(),
    )
    .map_err(to_js)
}

// =============================================================================
// Story Cache Handle
// =============================================================================

/// JS-facing wrapper over [`StoryCache`] using wall-clock time.
#[wasm_bindgen]
pub struct StoryCacheHandle {
    inner: StoryCache,
}

#[wasm_bindgen]
impl StoryCacheHandle {
    /// Create a cache from optional config JSON (missing fields use defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> std::result::Result<StoryCacheHandle, JsValue> {
        let config = parse_config(config_json.as_deref()).map_err(to_js)?;
        Ok(StoryCacheHandle {
            inner: StoryCache::from_config(&config),
        })
    }

    /// Verify and cache a story; returns the integrity report JSON.
    #[wasm_bindgen]
    pub fn put(
        &mut self,
        key: &str,
        chunks_json: &str,
        metadata_json: &str,
    ) -> std::result::Result<String, JsValue> {
        let chunks = parse_chunks(chunks_json).map_err(to_js)?;
        let metadata = parse_metadata(metadata_json).map_err(to_js)?;
        let report = self.inner.put(key, chunks, metadata, current_time_ms());
        serde_json::to_string(&report).map_err(|e| to_js(e.into()))
    }

    /// Snapshot JSON if still fresh, otherwise `undefined`.
    #[wasm_bindgen]
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.inner
            .get(key, current_time_ms())
            .and_then(|snapshot| serde_json::to_string(snapshot).ok())
    }

    #[wasm_bindgen]
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.inner.invalidate(key)
    }

    #[wasm_bindgen]
    pub fn cleanup_expired(&mut self) -> u32 {
        self.inner.cleanup_expired(current_time_ms())
    }

    #[wasm_bindgen]
    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.inner.get_stats()).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
