use std::collections::HashSet;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::ValidationError;
use crate::models::{chunk_set_hash, Chunk, UploadRequest, UploadResponse};
use crate::state::AppState;

/// POST /api/documents - accept a processed chunk set from the ingestion
/// pipeline, dedup it by content hash, and store it under its set hash for
/// later questions.
pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let (chunks, duplicates_dropped) =
        validate_and_dedup(req.chunks, state.config.max_upload_bytes)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let set_id = chunk_set_hash(&chunks);
    state.chunk_cache.put(&set_id, &chunks).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to store chunk set: {e}"),
        )
    })?;

    tracing::info!(
        "Stored chunk set {set_id} ({} chunks, {} duplicates dropped)",
        chunks.len(),
        duplicates_dropped
    );

    Ok(Json(UploadResponse {
        set_id,
        chunk_count: chunks.len(),
        duplicates_dropped,
    }))
}

/// Reject malformed or oversized sets before anything is stored, then drop
/// chunks whose content hash was already seen. Chunk identity is the
/// content hash, so the same text under two filenames stores once.
fn validate_and_dedup(
    chunks: Vec<Chunk>,
    max_bytes: usize,
) -> Result<(Vec<Chunk>, usize), ValidationError> {
    if chunks.is_empty() {
        return Err(ValidationError::NoChunks);
    }

    let total: usize = chunks.iter().map(|c| c.content.len()).sum();
    if total > max_bytes {
        return Err(ValidationError::TooLarge {
            size: total,
            limit: max_bytes,
        });
    }

    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.content.trim().is_empty() {
            return Err(ValidationError::EmptyChunk { index });
        }
    }

    let mut seen_hashes = HashSet::new();
    let before = chunks.len();
    let unique: Vec<Chunk> = chunks
        .into_iter()
        .filter(|chunk| seen_hashes.insert(chunk.content_hash()))
        .collect();
    let duplicates_dropped = before - unique.len();

    Ok((unique, duplicates_dropped))
}
