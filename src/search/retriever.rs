use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::cache::ContentCache;
use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::llm::Embedder;
use crate::models::{chunk_set_hash, Chunk, RankedChunk};
use crate::search::hybrid::{weighted_rank_fusion, FusionWeights};
use crate::search::lexical::LexicalIndex;
use crate::search::vector::{VectorEntry, VectorIndex};

/// Builds [`HybridRetriever`]s for uploaded chunk sets.
///
/// The lexical half is rebuilt fresh on every build; the semantic half is
/// looked up in the index cache by chunk-set hash and only embedded on a
/// miss. A per-hash async lock guarantees at most one embedding build in
/// flight per chunk set, so concurrent questions against a new set never
/// duplicate the expensive embedding work.
pub struct RetrieverBuilder {
    embedder: Arc<dyn Embedder>,
    index_cache: ContentCache,
    config: RetrievalConfig,
    weights: FusionWeights,
    build_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RetrieverBuilder {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index_cache: ContentCache,
        config: RetrievalConfig,
    ) -> anyhow::Result<Self> {
        let weights = FusionWeights::new(config.lexical_weight, config.semantic_weight)?;
        Ok(Self {
            embedder,
            index_cache,
            config,
            weights,
            build_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Build a retriever over `chunks`. Fails loudly if the semantic index
    /// cannot be built; there is no silent lexical-only fallback.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<HybridRetriever, RetrievalError> {
        let set_hash = chunk_set_hash(&chunks);

        let lexical = LexicalIndex::build(&chunks).map_err(RetrievalError::Build)?;

        let entries = match self.index_cache.get::<Vec<VectorEntry>>(&set_hash) {
            Some(entries) => {
                tracing::info!("Reusing cached vector index for set {set_hash}");
                entries
            }
            None => {
                let lock = self.build_lock(&set_hash);
                let _guard = lock.lock().await;

                // A concurrent builder may have finished while we waited.
                match self.index_cache.get::<Vec<VectorEntry>>(&set_hash) {
                    Some(entries) => entries,
                    None => {
                        let entries = self.embed_all(&chunks).await?;
                        if let Err(e) = self.index_cache.put(&set_hash, &entries) {
                            tracing::warn!(
                                "Failed to persist vector index for set {set_hash}: {e}"
                            );
                        }
                        entries
                    }
                }
            }
        };

        Ok(HybridRetriever {
            chunks: Arc::new(chunks),
            lexical: Arc::new(lexical),
            vectors: VectorIndex::new(entries),
            weights: self.weights,
            embedder: self.embedder.clone(),
        })
    }

    /// Embed every chunk in sequential batches bounded by
    /// `embed_batch_size`, so a single embedding call never exceeds the
    /// upstream request limit.
    async fn embed_all(&self, chunks: &[Chunk]) -> Result<Vec<VectorEntry>, RetrievalError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let batch_size = self.config.embed_batch_size.max(1);
        let total_batches = texts.len().div_ceil(batch_size);

        tracing::info!(
            "Embedding {} chunks in batches of {batch_size}...",
            texts.len()
        );

        let mut entries: Vec<VectorEntry> = Vec::with_capacity(texts.len());
        for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
            let embeddings = self
                .embedder
                .embed(batch)
                .await
                .map_err(|e| RetrievalError::Build(anyhow!(e)))?;
            if embeddings.len() != batch.len() {
                return Err(RetrievalError::Build(anyhow!(
                    "embedding backend returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for embedding in embeddings {
                entries.push(VectorEntry {
                    ordinal: entries.len(),
                    embedding,
                });
            }
            tracing::info!("Embedded batch {}/{total_batches}", batch_no + 1);
        }

        Ok(entries)
    }

    fn build_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.build_locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}

/// Combined lexical + semantic retriever over one chunk set. Read-only
/// after construction; safe to query from concurrent questions.
pub struct HybridRetriever {
    chunks: Arc<Vec<Chunk>>,
    lexical: Arc<LexicalIndex>,
    vectors: VectorIndex,
    weights: FusionWeights,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for HybridRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("chunks", &self.chunks.len())
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

impl HybridRetriever {
    /// Return the top-k chunks by combined relevance. The lexical search
    /// and the query embedding run concurrently; both must complete before
    /// the merge. An embedding failure fails the whole query rather than
    /// degrading to lexical-only.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RankedChunk>, RetrievalError> {
        // Fetch more than needed from each strategy so the fusion has
        // overlap to work with.
        let fetch_limit = k.saturating_mul(2).max(1);

        let lexical = self.lexical.clone();
        let lexical_query = query.to_string();
        let lexical_task =
            tokio::task::spawn_blocking(move || lexical.search(&lexical_query, fetch_limit));

        let semantic_task = async {
            let embeddings = self
                .embedder
                .embed(&[query.to_string()])
                .await
                .map_err(|e| RetrievalError::Query(anyhow!(e)))?;
            let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
                RetrievalError::Query(anyhow!("embedding backend returned no vector for the query"))
            })?;
            Ok::<_, RetrievalError>(self.vectors.search(&query_embedding, fetch_limit))
        };

        let (lexical_hits, semantic_hits) = tokio::join!(lexical_task, semantic_task);
        let lexical_hits = lexical_hits
            .map_err(|e| RetrievalError::Query(anyhow!("lexical search task failed: {e}")))?
            .map_err(RetrievalError::Query)?;
        let semantic_hits = semantic_hits?;

        let fused = weighted_rank_fusion(&lexical_hits, &semantic_hits, self.weights, k);

        Ok(fused
            .into_iter()
            .filter_map(|hit| {
                self.chunks.get(hit.ordinal).map(|chunk| RankedChunk {
                    chunk: chunk.clone(),
                    lexical_score: hit.lexical_score,
                    semantic_score: hit.semantic_score,
                    combined_score: hit.combined_score,
                })
            })
            .collect())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}
