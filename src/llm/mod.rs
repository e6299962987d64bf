//! Model collaborator seams.
//!
//! The workflow steps and the retriever depend on these traits, not on a
//! concrete backend, so tests substitute deterministic fakes and production
//! wires in [`provider::HttpLlm`].

pub mod provider;

use async_trait::async_trait;

use crate::error::InferenceError;

/// Text generation/classification capability: one prompt in, one completion
/// out. Failures are generic [`InferenceError`]s that every caller recovers
/// from locally.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, InferenceError>;
}

/// Embedding capability over a batch of texts. Returns one vector per input,
/// in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, InferenceError>;
}
