//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus the [`inner_product`] score used for ranking.
//!
//! Concrete provider implementations (OpenAI, Ollama, fastembed) live in
//! the `context-retrieval` app crate.

use anyhow::Result;

/// Trait for embedding providers.
///
/// `encode` must be deterministic for a fixed model and input, and must
/// return exactly one vector per input text, in input order.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text. Query-time special case of [`encode`](Self::encode).
    fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
    fn dims(&self) -> usize {
        (**self).dims()
    }
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).encode(texts)
    }
    fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode_one(text)
    }
}

/// Unnormalized dot product of two vectors.
///
/// Unlike cosine similarity this is magnitude-sensitive: scaling either
/// vector scales the score. Callers must pass vectors of equal length.
///
/// # Formula
///
/// ```text
/// a · b = Σ aᵢ × bᵢ
/// ```
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
