//! Data models shared by the corpus loader and the retrieval index.
//!
//! A [`ChunkRecord`] is the unit of retrievable text. A [`ContextBundle`]
//! is the per-call result of [`RetrievalIndex::retrieve`](crate::index::RetrievalIndex::retrieve).

use serde::Serialize;

/// Provenance of a chunk: which ingested file and line produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkSource {
    /// Origin identifier (the file name within its location).
    pub origin: String,
    /// Zero-based line number within the origin.
    pub sequence: usize,
}

impl std::fmt::Display for ChunkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.origin, self.sequence)
    }
}

/// A loaded chunk of text with its provenance.
///
/// Identity is the chunk's position in the loaded sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    pub text: String,
    pub source: ChunkSource,
}

impl ChunkRecord {
    pub fn new(text: impl Into<String>, origin: impl Into<String>, sequence: usize) -> Self {
        Self {
            text: text.into(),
            source: ChunkSource {
                origin: origin.into(),
                sequence,
            },
        }
    }

    /// Length in Unicode scalar values, the unit of the retrieval budget.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One chunk selected into a [`ContextBundle`].
#[derive(Debug, Clone, Serialize)]
pub struct SelectedChunk {
    /// Position of the chunk in the loaded corpus.
    pub index: usize,
    /// Zero-based position in the similarity ranking.
    pub rank: usize,
    /// Raw inner-product score against the query.
    pub score: f32,
    pub text: String,
    pub source: ChunkSource,
    /// Character length of `text`.
    pub chars: usize,
}

/// The ordered chunks selected by one retrieval call, best match first.
///
/// Built fresh per call; never cached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextBundle {
    pub chunks: Vec<SelectedChunk>,
    /// Sum of `chars` over `chunks`. Never exceeds the call's budget.
    pub total_chars: usize,
    /// True when the walk stopped because the next candidate did not fit.
    pub truncated_by_budget: bool,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// The selected texts, in rank order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.text.as_str())
    }

    /// Consume the bundle, keeping only the selected texts.
    pub fn into_texts(self) -> Vec<String> {
        self.chunks.into_iter().map(|c| c.text).collect()
    }

    /// Join the selected texts for injection into a prompt.
    pub fn join(&self, separator: &str) -> String {
        self.texts().collect::<Vec<_>>().join(separator)
    }
}
