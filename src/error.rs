use thiserror::Error;

/// Input rejected before the workflow runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("question cannot be empty")]
    EmptyQuestion,

    #[error("no chunks provided")]
    NoChunks,

    #[error("chunk {index} has empty content")]
    EmptyChunk { index: usize },

    #[error("total chunk size {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("unknown or expired document set: {0}")]
    UnknownSet(String),
}

/// Fatal retrieval failure. Surfaced to the caller; no answer is produced.
///
/// Distinct from an empty result list: a query that runs and matches
/// nothing is not an error.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to build retrieval index: {0}")]
    Build(#[source] anyhow::Error),

    #[error("retrieval query failed: {0}")]
    Query(#[source] anyhow::Error),
}

/// A model call failed. Recoverable at every workflow step: the gate falls
/// back to NO_MATCH, research to a fixed refusal string, verification to a
/// fail-closed verdict.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
}
