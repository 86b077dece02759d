//! # Context Retrieval
//!
//! Budget-constrained semantic retrieval over a corpus of short text chunks,
//! for injecting context into a downstream text-generation prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │ JSONL chunk  │──▶│ Corpus       │──▶│ RetrievalIndex   │──▶ context bundle
//! │ directories  │   │ Loader       │   │ embed + rank +   │
//! └──────────────┘   └──────────────┘   │ budget select    │
//!                                       └─────────────────┘
//! ```
//!
//! The index and the embedding trait live in `context-retrieval-core`;
//! this crate adds the filesystem loader, concrete embedding providers,
//! configuration, and the `ctxr` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | JSONL corpus loader |
//! | [`embedding`] | Embedding provider implementations |
//! | [`retrieve_cmd`] | One-shot retrieval command |
//! | [`session`] | Line-oriented retrieval session |
//! | [`sources`] | Corpus location listing |
//! | [`stats`] | Corpus statistics |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod logging;
pub mod retrieve_cmd;
pub mod session;
pub mod sources;
pub mod stats;

pub use context_retrieval_core::error::RetrievalError;
pub use context_retrieval_core::index::RetrievalIndex;
pub use context_retrieval_core::models::{ChunkRecord, ChunkSource, ContextBundle, SelectedChunk};
