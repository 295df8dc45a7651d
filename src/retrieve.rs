//! Evidence retriever over the passage index.
//!
//! | Mode | Backend | Needs embeddings |
//! |------|---------|------------------|
//! | `keyword` | FTS5 BM25 via [`PassageStore::keyword_search`] | no |
//! | `semantic` | cosine similarity via [`PassageStore::vector_search`] | yes |
//!
//! An empty index returns no passages without calling the embedder.
//! Ranking is the store's; the retriever only filters by `min_score` in
//! semantic mode and truncates to `n`.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use econ_analyst_core::embedding::{embed_query, EmbeddingProvider};
use econ_analyst_core::store::{PassageCandidate, PassageStore};

use crate::config::RetrievalConfig;
use crate::traits::EvidenceSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    Keyword,
    Semantic,
}

impl RetrievalMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "keyword" => Ok(Self::Keyword),
            "semantic" => Ok(Self::Semantic),
            other => bail!("Unknown retrieval mode: '{}'", other),
        }
    }
}

pub struct EvidenceRetriever {
    store: Arc<dyn PassageStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    mode: RetrievalMode,
    min_score: f64,
}

impl EvidenceRetriever {
    pub fn new(
        store: Arc<dyn PassageStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RetrievalConfig,
    ) -> Result<Self> {
        let mode = RetrievalMode::parse(&config.mode)?;
        if mode == RetrievalMode::Semantic && !embedder.is_enabled() {
            bail!("Semantic retrieval requires an embedding provider");
        }
        Ok(Self {
            store,
            embedder,
            mode,
            min_score: config.min_score,
        })
    }

    /// Ranked candidates with their scores, for callers that want them.
    pub async fn candidates(&self, query: &str, n: usize) -> Result<Vec<PassageCandidate>> {
        if n == 0 || self.store.count().await? == 0 {
            return Ok(Vec::new());
        }
        let limit = n as i64;

        let mut candidates = match self.mode {
            RetrievalMode::Keyword => self.store.keyword_search(query, limit).await?,
            RetrievalMode::Semantic => {
                let query_vec = embed_query(self.embedder.as_ref(), query).await?;
                let mut hits = self.store.vector_search(&query_vec, limit).await?;
                hits.retain(|c| c.score >= self.min_score);
                hits
            }
        };
        candidates.truncate(n);
        Ok(candidates)
    }
}

#[async_trait]
impl EvidenceSource for EvidenceRetriever {
    async fn search(&self, query: &str, n: usize) -> Result<Vec<String>> {
        let candidates = self.candidates(query, n).await?;
        tracing::debug!(mode = ?self.mode, hits = candidates.len(), "evidence retrieved");
        Ok(candidates.into_iter().map(|c| c.text).collect())
    }
}
