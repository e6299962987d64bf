//! # docqa
//!
//! A Rust web service that answers natural-language questions over a small
//! uploaded document set, verifying every draft against the retrieved text
//! before accepting it.
//!
//! ## Architecture
//!
//! Each question runs through an explicit state machine:
//!
//! ```text
//!                    ┌──────────────────┐
//!                    │ Question + SetId │
//!                    └────────┬─────────┘
//!                             │
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │   Hybrid Retriever    │
//!                 │  BM25 (fresh, in-RAM) │
//!                 │  + Vectors (cached by │
//!                 │    chunk-set hash)    │
//!                 │  weighted rank fusion │
//!                 └───────────┬───────────┘
//!                             │ top-20 chunks
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │    Relevance Gate     │
//!                 │ CAN_ANSWER / PARTIAL  │
//!                 │      / NO_MATCH       │
//!                 └─────┬───────────┬─────┘
//!                       │ NO_MATCH  │ otherwise
//!                       ▼           ▼
//!                 ┌──────────┐  ┌───────────────────┐
//!                 │ Refusal  │  │     Research      │◄──┐
//!                 └──────────┘  │ draft + citations │   │
//!                               └─────────┬─────────┘   │
//!                                         │             │ rejected
//!                                         ▼             │ (≤ 3 passes)
//!                               ┌───────────────────┐   │
//!                               │   Verification    │───┘
//!                               │ supported?        │
//!                               │ relevant?         │
//!                               └─────────┬─────────┘
//!                                         │ accepted (or bound hit)
//!                                         ▼
//!                               ┌───────────────────┐
//!                               │ answer + report   │
//!                               │ + deduped sources │
//!                               └───────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, caches, LLM,
//!   retrieval weights, and workflow bounds
//! - [`models`] - Shared data types: `Chunk`, `RankedChunk`, `Answer`,
//!   `Verdict`, request/response types, content hashing
//! - [`error`] - Typed error taxonomy: validation and retrieval errors
//!   escape to the caller, inference errors are absorbed by the workflow
//! - [`cache`] - Content-addressed disk cache with lazy time-based expiry
//! - [`llm`] - `TextGenerator`/`Embedder` seams and the Ollama /
//!   OpenAI-compatible HTTP implementation
//! - [`search`] - In-RAM tantivy BM25 index, cosine vector index, weighted
//!   reciprocal-rank fusion, and the cached retriever builder
//! - [`workflow`] - Relevance gate, research and verification steps, and
//!   the bounded state machine sequencing them
//! - [`api`] - Axum handlers for chunk-set upload and question answering
//! - [`state`] - Shared application state wiring config, caches, and
//!   collaborators

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
pub mod workflow;
