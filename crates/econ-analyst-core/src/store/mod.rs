//! Storage abstraction for the similarity index.
//!
//! The [`PassageStore`] trait defines the operations the retrieval and
//! ingestion paths need, enabling pluggable backends (SQLite in the app
//! crate, in-memory here for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Passage;

/// A passage returned from keyword or vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageCandidate {
    pub passage_id: String,
    pub document: String,
    pub text: String,
    /// Backend score, higher is better (negated BM25 rank or cosine similarity).
    pub score: f64,
}

/// Abstract similarity index over ingested passages.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`replace_document`](PassageStore::replace_document) | Replace all passages of a document |
/// | [`count`](PassageStore::count) | Number of indexed passages |
/// | [`keyword_search`](PassageStore::keyword_search) | Full-text keyword search |
/// | [`vector_search`](PassageStore::vector_search) | Cosine similarity search |
///
/// Both searches return candidates sorted by score descending, ties broken
/// by passage id ascending.
#[async_trait]
pub trait PassageStore: Send + Sync {
    /// Replace every passage of `document`, optionally storing one vector
    /// per passage (same order as `passages`).
    async fn replace_document(
        &self,
        document: &str,
        passages: &[Passage],
        vectors: Option<&[Vec<f32>]>,
        model: &str,
    ) -> Result<()>;

    /// Number of indexed passages.
    async fn count(&self) -> Result<i64>;

    /// Keyword search over passage text.
    async fn keyword_search(&self, query: &str, limit: i64) -> Result<Vec<PassageCandidate>>;

    /// Cosine similarity search over stored passage vectors.
    async fn vector_search(&self, query_vec: &[f32], limit: i64) -> Result<Vec<PassageCandidate>>;
}

/// Sort candidates by score descending, then passage id ascending.
pub fn rank_candidates(candidates: &mut [PassageCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.passage_id.cmp(&b.passage_id))
    });
}

/// Lower-cased alphanumeric terms of a free-text query.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
