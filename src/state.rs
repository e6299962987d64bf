use std::sync::Arc;
use std::time::Duration;

use crate::cache::ContentCache;
use crate::config::Config;
use crate::llm::provider::HttpLlm;
use crate::search::retriever::RetrieverBuilder;
use crate::workflow::controller::Workflow;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Uploaded chunk sets, keyed by chunk-set hash, time-expired.
    pub chunk_cache: Arc<ContentCache>,
    /// Retriever factory owning the vector index cache and build locks.
    pub builder: Arc<RetrieverBuilder>,
    pub workflow: Arc<Workflow>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let llm = Arc::new(HttpLlm::new(http_client, config.llm.clone()));

        let chunk_expiry = Duration::from_secs(config.chunk_cache_expire_days * 24 * 60 * 60);
        let chunk_cache = ContentCache::open(&config.chunk_cache_dir(), Some(chunk_expiry))?;
        let index_cache = ContentCache::open(&config.index_cache_dir(), None)?;

        let builder = RetrieverBuilder::new(llm.clone(), index_cache, config.retrieval.clone())?;
        let workflow = Workflow::new(llm, config.workflow.clone());

        Ok(Self {
            config,
            chunk_cache: Arc::new(chunk_cache),
            builder: Arc::new(builder),
            workflow: Arc::new(workflow),
        })
    }
}
