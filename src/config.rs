use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where chunk sets and vector indexes are cached
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Retrieval engine configuration
    pub retrieval: RetrievalConfig,
    /// Answer workflow configuration
    pub workflow: WorkflowConfig,
    /// Uploaded chunk sets expire after this many days
    pub chunk_cache_expire_days: u64,
    /// Maximum total content size of one uploaded chunk set, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for drafting and classification
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Weight of the lexical ranking in the hybrid merge
    pub lexical_weight: f32,
    /// Weight of the semantic ranking in the hybrid merge
    pub semantic_weight: f32,
    /// Maximum chunks per embedding call when building the vector index
    pub embed_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// How many top chunks the relevance gate classifies over
    pub relevance_k: usize,
    /// Maximum research passes before the loop is forced to end
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            workflow: WorkflowConfig::default(),
            chunk_cache_expire_days: 7,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.4,
            semantic_weight: 0.6,
            embed_batch_size: 500,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            relevance_k: 20,
            max_iterations: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("DOCQA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("DOCQA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("DOCQA_LEXICAL_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.retrieval.lexical_weight = v;
            }
        }
        if let Ok(val) = std::env::var("DOCQA_SEMANTIC_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.retrieval.semantic_weight = v;
            }
        }
        if let Ok(val) = std::env::var("DOCQA_EMBED_BATCH_SIZE") {
            if let Ok(v) = val.parse() {
                config.retrieval.embed_batch_size = v;
            }
        }
        if let Ok(val) = std::env::var("DOCQA_RELEVANCE_K") {
            if let Ok(v) = val.parse() {
                config.workflow.relevance_k = v;
            }
        }
        if let Ok(val) = std::env::var("DOCQA_MAX_ITERATIONS") {
            if let Ok(v) = val.parse() {
                config.workflow.max_iterations = v;
            }
        }
        if let Ok(val) = std::env::var("DOCQA_CHUNK_CACHE_EXPIRE_DAYS") {
            if let Ok(v) = val.parse() {
                config.chunk_cache_expire_days = v;
            }
        }
        if let Ok(val) = std::env::var("DOCQA_MAX_UPLOAD_BYTES") {
            if let Ok(v) = val.parse() {
                config.max_upload_bytes = v;
            }
        }

        config
    }

    pub fn chunk_cache_dir(&self) -> PathBuf {
        self.data_dir.join("chunks")
    }

    pub fn index_cache_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }
}
