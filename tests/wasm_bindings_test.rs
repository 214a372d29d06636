//! Browser-side binding tests (run with `wasm-pack test --headless --chrome`)

#![cfg(target_arch = "wasm32")]

use deepfamily_core::wasm::{
    generate_cid_js, generate_cid_reference_js, hash_chunk_content_js, verify_consistency_js,
    StoryCacheHandle,
};
use deepfamily_core::{StoryChunk, StoryMetadata};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const SCHEMA_DOC: &str = r#"{"schema":"x","tag":"v1"}"#;
const SCHEMA_CID: &str = "bafkreia3sb44vqh6k22w2ltyfy7dedb7udhep3rs5aofqbtasnqzngxtwe";

#[wasm_bindgen_test]
fn test_generate_cid_from_js_string() {
    let cid = generate_cid_js(JsValue::from_str(SCHEMA_DOC), None).unwrap();
    assert_eq!(cid, SCHEMA_CID);
}

#[wasm_bindgen_test]
fn test_non_string_document_fails_fast() {
    assert!(generate_cid_js(JsValue::from_f64(42.0), None).is_err());
    assert!(generate_cid_js(JsValue::NULL, None).is_err());
    assert!(hash_chunk_content_js(JsValue::UNDEFINED).is_err());
    assert!(verify_consistency_js(JsValue::TRUE).is_err());
}

#[wasm_bindgen_test]
async fn test_reference_promise_matches_manual() {
    let reference = generate_cid_reference_js(JsValue::from_str(SCHEMA_DOC))
        .await
        .unwrap();
    assert_eq!(reference, SCHEMA_CID);
}

#[wasm_bindgen_test]
fn test_story_cache_handle() {
    let chunks = vec![StoryChunk::new(0, "Born in Lyon.")];
    let metadata = StoryMetadata::from_chunks(&chunks, true, 0);

    let mut cache = StoryCacheHandle::new(None).unwrap();
    let report = cache
        .put(
            "token-7",
            &serde_json::to_string(&chunks).unwrap(),
            &serde_json::to_string(&metadata).unwrap(),
        )
        .unwrap();
    assert!(report.contains("\"hashMatch\":true"));
    assert!(cache.get("token-7").is_some());
    assert!(cache.invalidate("token-7"));
    assert!(cache.get("token-7").is_none());
}
