//! Content identifiers for metadata documents
//!
//! A document's CID is CIDv1 with the `raw` codec over a sha2-256 multihash,
//! rendered as base32-lower multibase (`bafkrei...`), the same form IPFS
//! tooling produces for raw blocks.
//!
//! Two encoders exist:
//! - [`ManualCidGenerator`] - builds the binary CID by hand; no multiformats
//!   dependency on the hot path. This is what the frontend uses at runtime.
//! - [`ReferenceCidGenerator`] - goes through the `cid` crate. Kept to
//!   cross-check the manual encoder; see [`verify_consistency`].
//!
//! Both must return byte-identical strings for every input.
//!
//! ## Example
//!
//! ```rust
//! use deepfamily_core::{generate_cid, verify_consistency};
//!
//! let cid = generate_cid("");
//! assert_eq!(cid, "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku");
//! assert!(verify_consistency("").consistent);
//! ```

use crate::error::{CoreError, Result};
use cid::Cid;
use data_encoding::BASE32_NOPAD;
use multihash_codetable::{Code, MultihashDigest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;
use tracing::warn;

/// CID version byte
const CID_V1: u8 = 0x01;

/// Multicodec for raw bytes
pub const RAW_CODEC: u64 = 0x55;

/// Multihash code for sha2-256
pub const SHA2_256: u64 = 0x12;

/// sha2-256 digest length
const SHA2_256_LEN: usize = 32;

/// Multibase prefix for base32 lower
const BASE32_LOWER_PREFIX: char = 'b';

// =============================================================================
// Strategy
// =============================================================================

/// Which encoder produces CIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CidMethod {
    /// Hand-built binary CID, base32 encoded directly
    #[default]
    Manual,
    /// `cid` crate encoder
    Reference,
}

impl CidMethod {
    pub fn generator(self) -> &'static dyn CidGenerator {
        match self {
            CidMethod::Manual => &ManualCidGenerator,
            CidMethod::Reference => &ReferenceCidGenerator,
        }
    }
}

/// Maps a UTF-8 document to its CIDv1 string.
pub trait CidGenerator: Send + Sync {
    fn method(&self) -> CidMethod;

    fn generate(&self, document: &str) -> String;
}

/// Encodes the CID bytes by hand.
///
/// Version, codec, hash code and digest length are all below 0x80, so each
/// varint is a single byte: `01 55 12 20 <digest>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualCidGenerator;

impl CidGenerator for ManualCidGenerator {
    fn method(&self) -> CidMethod {
        CidMethod::Manual
    }

    fn generate(&self, document: &str) -> String {
        let digest = Sha256::digest(document.as_bytes());

        let mut bytes = Vec::with_capacity(4 + SHA2_256_LEN);
        bytes.push(CID_V1);
        bytes.push(RAW_CODEC as u8);
        bytes.push(SHA2_256 as u8);
        bytes.push(SHA2_256_LEN as u8);
        bytes.extend_from_slice(&digest);

        let mut out = String::with_capacity(1 + (bytes.len() * 8 + 4) / 5);
        out.push(BASE32_LOWER_PREFIX);
        out.push_str(&BASE32_NOPAD.encode(&bytes).to_ascii_lowercase());
        out
    }
}

/// Encodes through the `cid` and `multihash-codetable` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceCidGenerator;

impl CidGenerator for ReferenceCidGenerator {
    fn method(&self) -> CidMethod {
        CidMethod::Reference
    }

    fn generate(&self, document: &str) -> String {
        let hash = Code::Sha2_256.digest(document.as_bytes());
        // CIDv1 displays as base32 lower by default
        Cid::new_v1(RAW_CODEC, hash).to_string()
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// CID of a document using the runtime encoder.
pub fn generate_cid(document: &str) -> String {
    ManualCidGenerator.generate(document)
}

/// CID of a document using an explicitly chosen encoder.
pub fn generate_cid_with(document: &str, method: CidMethod) -> String {
    method.generator().generate(document)
}

/// CID of a document via the reference encoder.
///
/// Async so the wasm export surfaces as a Promise, like the JS library it
/// stands in for.
pub async fn generate_cid_reference(document: &str) -> String {
    ReferenceCidGenerator.generate(document)
}

/// Result of running both encoders on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub own: String,
    pub reference: String,
}

/// Run both encoders and compare. For tests and development checks only.
pub fn verify_consistency(document: &str) -> ConsistencyReport {
    let own = ManualCidGenerator.generate(document);
    let reference = ReferenceCidGenerator.generate(document);
    let consistent = own == reference;

    if !consistent {
        warn!(own = %own, reference = %reference, "CID encoders disagree");
    }

    ConsistencyReport {
        consistent,
        own,
        reference,
    }
}

/// CID of a record's JSON serialization (fields in declaration order).
pub fn metadata_cid<T: Serialize>(record: &T) -> Result<String> {
    let document = serde_json::to_string(record)?;
    Ok(generate_cid(&document))
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a CID and return its sha2-256 digest.
///
/// Accepts any CID version and codec as long as the multihash is sha2-256,
/// so v0 (`Qm...`) attachment CIDs still resolve.
pub fn parse_cid_digest(cid: &str) -> Result<[u8; 32]> {
    let parsed = Cid::from_str(cid.trim())
        .map_err(|e| CoreError::InvalidCid(format!("{}: {}", cid, e)))?;

    let hash = parsed.hash();
    if hash.code() != SHA2_256 {
        return Err(CoreError::InvalidCid(format!(
            "unsupported hash function 0x{:x} (expected sha2-256)",
            hash.code()
        )));
    }

    hash.digest().try_into().map_err(|_| {
        CoreError::InvalidCid(format!(
            "expected {} byte digest, got {}",
            SHA2_256_LEN,
            hash.digest().len()
        ))
    })
}

/// Whether `bytes` hash to the digest named by `cid`.
pub fn content_matches_cid(bytes: &[u8], cid: &str) -> Result<bool> {
    let expected = parse_cid_digest(cid)?;
    let actual: [u8; 32] = Sha256::digest(bytes).into();
    Ok(actual == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_CID: &str = "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku";
    const SCHEMA_DOC: &str = r#"{"schema":"x","tag":"v1"}"#;
    const SCHEMA_CID: &str = "bafkreia3sb44vqh6k22w2ltyfy7dedb7udhep3rs5aofqbtasnqzngxtwe";

    #[test]
    fn test_empty_document_cid() {
        assert_eq!(generate_cid(""), EMPTY_CID);
    }

    #[test]
    fn test_schema_fixture_both_paths() {
        assert_eq!(generate_cid(SCHEMA_DOC), SCHEMA_CID);
        assert_eq!(generate_cid_with(SCHEMA_DOC, CidMethod::Reference), SCHEMA_CID);
        assert_eq!(tokio_test::block_on(generate_cid_reference(SCHEMA_DOC)), SCHEMA_CID);
    }

    #[test]
    fn test_consistency_report() {
        let report = verify_consistency("Jean Dupont, né à Lyon 🌳");
        assert!(report.consistent, "{:?}", report);
        assert_eq!(report.own, report.reference);
    }

    #[test]
    fn test_generator_methods() {
        assert_eq!(CidMethod::Manual.generator().method(), CidMethod::Manual);
        assert_eq!(CidMethod::Reference.generator().method(), CidMethod::Reference);
    }

    #[test]
    fn test_single_char_change_changes_cid() {
        assert_ne!(
            generate_cid(SCHEMA_DOC),
            generate_cid(r#"{"schema":"x","tag":"v2"}"#)
        );
    }

    #[test]
    fn test_parse_cid_digest_roundtrip() {
        let digest = parse_cid_digest(SCHEMA_CID).unwrap();
        let expected: [u8; 32] = Sha256::digest(SCHEMA_DOC.as_bytes()).into();
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_content_matches_cid() {
        assert!(content_matches_cid(SCHEMA_DOC.as_bytes(), SCHEMA_CID).unwrap());
        assert!(!content_matches_cid(b"something else", SCHEMA_CID).unwrap());
    }

    #[test]
    fn test_parse_cid_invalid() {
        assert!(parse_cid_digest("not-a-cid").is_err());
        assert!(parse_cid_digest("").is_err());
    }

    #[test]
    fn test_metadata_cid_uses_field_order() {
        #[derive(Serialize)]
        struct Tag<'a> {
            schema: &'a str,
            tag: &'a str,
        }

        let cid = metadata_cid(&Tag { schema: "x", tag: "v1" }).unwrap();
        assert_eq!(cid, SCHEMA_CID);
    }
}
