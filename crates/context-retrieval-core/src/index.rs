//! Budget-constrained semantic retrieval index.
//!
//! A [`RetrievalIndex`] owns an embedding provider, the loaded chunks, and
//! one embedding vector per chunk. It is built once and is read-only
//! afterwards, so `retrieve` may be called from several readers at once.
//!
//! # Retrieval Algorithm
//!
//! 1. Embed the query with the same provider used for the chunks.
//! 2. Score every chunk by raw inner product with the query vector.
//! 3. Sort by score (desc); equal scores keep corpus order.
//! 4. Keep the first `top_n` candidates.
//! 5. Walk candidates in rank order, adding whole chunks while the running
//!    character total stays within `max_chars`. The first candidate that
//!    does not fit ends the walk; later candidates are never considered.

use tracing::{debug, info};

use crate::embedding::{inner_product, EmbeddingProvider};
use crate::error::{Result, RetrievalError};
use crate::models::{ChunkRecord, ContextBundle, SelectedChunk};

/// In-memory embedding matrix over an immutable chunk list.
pub struct RetrievalIndex<P: EmbeddingProvider> {
    provider: P,
    chunks: Vec<ChunkRecord>,
    matrix: Vec<Vec<f32>>,
    dims: usize,
}

impl<P: EmbeddingProvider> RetrievalIndex<P> {
    /// Embed every chunk in one batch call and build the index.
    ///
    /// An empty chunk list builds a valid index without calling the
    /// provider; every retrieval against it returns an empty bundle.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::EmbeddingBackend`] if the provider fails,
    /// returns a vector count different from the chunk count, or returns
    /// vectors of inconsistent length.
    pub fn build(provider: P, chunks: Vec<ChunkRecord>) -> Result<Self> {
        if chunks.is_empty() {
            info!(model = provider.model_name(), "built empty retrieval index");
            return Ok(Self {
                provider,
                chunks,
                matrix: Vec::new(),
                dims: 0,
            });
        }

        let backend_err = |message: String| RetrievalError::EmbeddingBackend {
            model: provider.model_name().to_string(),
            message,
        };

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let matrix = provider
            .encode(&texts)
            .map_err(|e| backend_err(format!("{e:#}")))?;

        if matrix.len() != chunks.len() {
            return Err(backend_err(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                matrix.len()
            )));
        }

        let dims = matrix[0].len();
        if dims == 0 {
            return Err(backend_err("returned zero-length vectors".to_string()));
        }
        if let Some(pos) = matrix.iter().position(|v| v.len() != dims) {
            return Err(backend_err(format!(
                "vector {} has {} dims, expected {}",
                pos,
                matrix[pos].len(),
                dims
            )));
        }

        info!(
            chunks = chunks.len(),
            model = provider.model_name(),
            dims,
            "built retrieval index"
        );

        Ok(Self {
            provider,
            chunks,
            matrix,
            dims,
        })
    }

    /// Select the best-matching chunks for `query` within a character budget.
    ///
    /// Returns an empty bundle when `top_n` is 0 or the index is empty,
    /// without calling the provider. An empty bundle is a successful
    /// "nothing fits" answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::QueryEmbedding`] if the provider fails to
    /// embed the query or returns a vector of the wrong dimensionality.
    pub fn retrieve(&self, query: &str, top_n: usize, max_chars: usize) -> Result<ContextBundle> {
        if top_n == 0 || self.chunks.is_empty() {
            return Ok(ContextBundle::default());
        }

        let query_err = |message: String| RetrievalError::QueryEmbedding {
            model: self.provider.model_name().to_string(),
            message,
        };

        let query_vec = self
            .provider
            .encode_one(query)
            .map_err(|e| query_err(format!("{e:#}")))?;

        if query_vec.len() != self.dims {
            return Err(query_err(format!(
                "query vector has {} dims, index has {}",
                query_vec.len(),
                self.dims
            )));
        }

        let mut ranked = rank_by_inner_product(&self.matrix, &query_vec);
        ranked.truncate(top_n);

        let bundle = select_within_budget(&ranked, &self.chunks, max_chars);
        debug!(
            candidates = ranked.len(),
            selected = bundle.len(),
            chars = bundle.total_chars,
            max_chars,
            truncated = bundle.truncated_by_budget,
            "retrieved context"
        );
        Ok(bundle)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The indexed chunks, in load order.
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    /// Dimensionality of the stored vectors (0 for an empty index).
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}

/// Score every row of `matrix` against `query` and sort best-first.
///
/// Returns `(row_index, score)` pairs. The sort is stable, so rows with
/// equal scores stay in ascending row order.
pub fn rank_by_inner_product(matrix: &[Vec<f32>], query: &[f32]) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| (i, inner_product(row, query)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Greedy prefix selection over ranked candidates.
///
/// Walks `ranked` in order and stops at the first chunk whose full text
/// would push the total past `max_chars`. Chunks are never split.
pub fn select_within_budget(
    ranked: &[(usize, f32)],
    chunks: &[ChunkRecord],
    max_chars: usize,
) -> ContextBundle {
    let mut bundle = ContextBundle::default();

    for (rank, &(index, score)) in ranked.iter().enumerate() {
        let chunk = &chunks[index];
        let chars = chunk.char_len();
        if bundle.total_chars + chars > max_chars {
            bundle.truncated_by_budget = true;
            break;
        }
        bundle.total_chars += chars;
        bundle.chunks.push(SelectedChunk {
            index,
            rank,
            score,
            text: chunk.text.clone(),
            source: chunk.source.clone(),
            chars,
        });
    }

    bundle
}
