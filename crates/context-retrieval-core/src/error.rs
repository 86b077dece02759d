//! Error types for the retrieval index.

/// Errors raised while building or querying a [`RetrievalIndex`](crate::index::RetrievalIndex).
///
/// "No relevant results" is never an error; it is an empty bundle.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The embedding backend failed while embedding the corpus.
    #[error("embedding backend error while building index with '{model}': {message}")]
    EmbeddingBackend { model: String, message: String },

    /// The embedding backend failed while embedding a query.
    #[error("embedding backend error while embedding query with '{model}': {message}")]
    QueryEmbedding { model: String, message: String },
}

/// Result type alias using `RetrievalError`.
pub type Result<T> = std::result::Result<T, RetrievalError>;
