use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::ValidationError;
use crate::models::{AskRequest, AskResponse, Chunk};
use crate::state::AppState;

/// POST /api/ask - answer a question against a previously uploaded chunk
/// set:
///   1. Load the chunk set from the chunk cache (expired sets read as
///      unknown and must be re-uploaded).
///   2. Build or reuse the hybrid retriever for the set.
///   3. Run the gate → research → verify workflow.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            ValidationError::EmptyQuestion.to_string(),
        ));
    }

    let chunks: Vec<Chunk> = state.chunk_cache.get(&req.set_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            ValidationError::UnknownSet(req.set_id.clone()).to_string(),
        )
    })?;

    let retriever = state.builder.build(chunks).await.map_err(|e| {
        tracing::error!("Retriever build failed for set {}: {e}", req.set_id);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let outcome = state.workflow.answer(&question, &retriever).await.map_err(|e| {
        tracing::error!("Retrieval failed for set {}: {e}", req.set_id);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(AskResponse {
        answer: outcome.draft_answer,
        verification_report: outcome.verification_report,
        sources: outcome.sources,
    }))
}
