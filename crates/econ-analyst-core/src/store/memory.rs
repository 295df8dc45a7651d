//! In-memory [`PassageStore`] implementation for tests.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Vector search is brute-force
//! cosine similarity; keyword search scores a passage by how many distinct
//! query terms it contains.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::Passage;

use super::{query_terms, rank_candidates, PassageCandidate, PassageStore};

struct StoredVector {
    passage_id: String,
    document: String,
    vector: Vec<f32>,
}

/// In-memory passage store.
#[derive(Default)]
pub struct InMemoryStore {
    passages: RwLock<Vec<Passage>>,
    vectors: RwLock<Vec<StoredVector>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl PassageStore for InMemoryStore {
    async fn replace_document(
        &self,
        document: &str,
        passages: &[Passage],
        vectors: Option<&[Vec<f32>]>,
        _model: &str,
    ) -> Result<()> {
        {
            let mut stored = self.passages.write().map_err(poisoned)?;
            stored.retain(|p| p.document != document);
            stored.extend(passages.iter().cloned());
        }

        let mut stored_vecs = self.vectors.write().map_err(poisoned)?;
        stored_vecs.retain(|sv| sv.document != document);
        if let Some(vecs) = vectors {
            for (p, v) in passages.iter().zip(vecs.iter()) {
                stored_vecs.push(StoredVector {
                    passage_id: p.id.clone(),
                    document: document.to_string(),
                    vector: v.clone(),
                });
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.passages.read().map_err(poisoned)?.len() as i64)
    }

    async fn keyword_search(&self, query: &str, limit: i64) -> Result<Vec<PassageCandidate>> {
        let mut terms = query_terms(query);
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self.passages.read().map_err(poisoned)?;
        let mut candidates: Vec<PassageCandidate> = stored
            .iter()
            .filter_map(|p| {
                let text = p.text.to_lowercase();
                let matches = terms.iter().filter(|t| text.contains(t.as_str())).count();
                (matches > 0).then(|| PassageCandidate {
                    passage_id: p.id.clone(),
                    document: p.document.clone(),
                    text: p.text.clone(),
                    score: matches as f64,
                })
            })
            .collect();

        rank_candidates(&mut candidates);
        candidates.truncate(limit.max(0) as usize);
        Ok(candidates)
    }

    async fn vector_search(&self, query_vec: &[f32], limit: i64) -> Result<Vec<PassageCandidate>> {
        let stored = self.passages.read().map_err(poisoned)?;
        let vecs = self.vectors.read().map_err(poisoned)?;

        let mut candidates: Vec<PassageCandidate> = vecs
            .iter()
            .filter_map(|sv| {
                let passage = stored.iter().find(|p| p.id == sv.passage_id)?;
                Some(PassageCandidate {
                    passage_id: passage.id.clone(),
                    document: passage.document.clone(),
                    text: passage.text.clone(),
                    score: cosine_similarity(query_vec, &sv.vector) as f64,
                })
            })
            .collect();

        rank_candidates(&mut candidates);
        candidates.truncate(limit.max(0) as usize);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_document;

    fn passages(doc: &str, text: &str) -> Vec<Passage> {
        chunk_document(doc, text, 800, 150)
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = InMemoryStore::new();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.keyword_search("inflation", 3).await.unwrap().is_empty());
        assert!(store.vector_search(&[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_document_no_duplicates() {
        let store = InMemoryStore::new();
        let p = passages("weo", "Inflation is easing across the euro area.");
        store.replace_document("weo", &p, None, "").await.unwrap();
        store.replace_document("weo", &p, None, "").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_keyword_search_ranks_by_term_hits() {
        let store = InMemoryStore::new();
        store
            .replace_document("a", &passages("a", "Inflation in Germany fell."), None, "")
            .await
            .unwrap();
        store
            .replace_document("b", &passages("b", "Wage growth in France."), None, "")
            .await
            .unwrap();

        let results = store.keyword_search("Germany inflation?", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].passage_id, "a_chunk_0");
        assert_eq!(results[0].score, 2.0);
    }

    #[tokio::test]
    async fn test_vector_search_orders_by_similarity() {
        let store = InMemoryStore::new();
        let a = passages("a", "alpha");
        let b = passages("b", "beta");
        store
            .replace_document("a", &a, Some(&[vec![1.0, 0.0]][..]), "m")
            .await
            .unwrap();
        store
            .replace_document("b", &b, Some(&[vec![0.6, 0.8]][..]), "m")
            .await
            .unwrap();

        let results = store.vector_search(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "beta");
    }
}
