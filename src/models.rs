use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A retrievable unit of document text with provenance metadata.
///
/// Chunks are produced by an external ingestion pipeline and arrive over the
/// upload API. Identity for dedup purposes is the SHA-256 of `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Document identifier, e.g. a filename.
    pub source: String,
    pub page: Option<u32>,
    /// Header-path metadata from the splitter. Carried, not interpreted.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub section: BTreeMap<String, String>,
}

impl Chunk {
    pub fn content_hash(&self) -> String {
        sha256_hex(self.content.as_bytes())
    }
}

/// Hash identifying a whole chunk set: SHA-256 over the concatenated chunk
/// contents, truncated to 16 hex chars. Used as the cache key for both the
/// uploaded set and its vector index.
pub fn chunk_set_hash(chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.content.as_bytes());
    }
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(16);
    hex
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A chunk scored by the hybrid retriever. Ephemeral, produced per query.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub combined_score: f32,
}

/// Relevance gate output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceLabel {
    CanAnswer,
    Partial,
    NoMatch,
}

/// One numbered citation entry, parallel to the `[Source N: ...]` tags
/// embedded in the research prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub index: usize,
    pub source: String,
    pub page: Option<u32>,
}

/// A drafted answer plus the context and citations it was generated from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub draft: String,
    pub sources: Vec<SourceRef>,
    pub context_used: String,
}

/// Structured verification outcome. Each verification call produces a fresh
/// verdict that fully replaces the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub supported: bool,
    pub unsupported_claims: Vec<String>,
    pub contradictions: Vec<String>,
    pub relevant: bool,
    pub notes: String,
}

impl Verdict {
    /// Fail-closed verdict used when the model cannot confirm support.
    pub fn fail_closed(notes: impl Into<String>) -> Self {
        Self {
            supported: false,
            unsupported_claims: Vec::new(),
            contradictions: Vec::new(),
            relevant: false,
            notes: notes.into(),
        }
    }

    pub fn passes(&self) -> bool {
        self.supported && self.relevant
    }
}

// ─── API types ───────────────────────────────────────────

/// POST /api/documents request: an ordered chunk set from the ingestion
/// pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Content hash identifying the stored set; pass it to /api/ask.
    pub set_id: String,
    pub chunk_count: usize,
    pub duplicates_dropped: usize,
}

/// POST /api/ask request.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub set_id: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub verification_report: String,
    pub sources: Vec<SourceRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source: "doc.pdf".to_string(),
            page: None,
            section: BTreeMap::new(),
        }
    }

    #[test]
    fn test_content_hash_stable_across_metadata() {
        let mut a = chunk("same text");
        let b = chunk("same text");
        a.source = "other.pdf".to_string();
        a.page = Some(3);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_set_hash_is_16_hex_chars() {
        let hash = chunk_set_hash(&[chunk("alpha"), chunk("beta")]);
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_set_hash_changes_with_content() {
        let a = chunk_set_hash(&[chunk("alpha")]);
        let b = chunk_set_hash(&[chunk("alpha"), chunk("beta")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_hash_order_sensitive() {
        let ab = chunk_set_hash(&[chunk("alpha"), chunk("beta")]);
        let ba = chunk_set_hash(&[chunk("beta"), chunk("alpha")]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_chunk_deserializes_without_section() {
        let json = r#"{"content":"text","source":"a.pdf","page":2}"#;
        let chunk: Chunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.page, Some(2));
        assert!(chunk.section.is_empty());
    }
}
