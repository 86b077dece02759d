//! # Context Retrieval Core
//!
//! Pure retrieval logic for Context Retrieval: chunk models, the embedding
//! provider trait, and the budget-constrained [`index::RetrievalIndex`].
//!
//! This crate performs no filesystem or network I/O. Loading chunks from
//! disk and talking to embedding backends live in the `context-retrieval`
//! app crate.

pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
