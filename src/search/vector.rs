use serde::{Deserialize, Serialize};

/// One embedded chunk, parallel to the chunk slice by `ordinal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub ordinal: usize,
    pub embedding: Vec<f32>,
}

/// Embedding table for one chunk set with cosine similarity search.
///
/// Built once per chunk-set hash and persisted through the content cache;
/// queries are read-only.
pub struct VectorIndex {
    entries: Vec<VectorEntry>,
}

impl VectorIndex {
    pub fn new(entries: Vec<VectorEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search by cosine similarity against a query embedding. Returns
    /// `(chunk ordinal, similarity)` pairs, best first.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .map(|e| (e.ordinal, cosine_similarity(query_embedding, &e.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
