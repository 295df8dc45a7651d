//! SQLite-backed [`PassageStore`] implementation.
//!
//! Passages live in `passages`, their text is mirrored into the
//! `passages_fts` FTS5 table, and embeddings are stored as little-endian
//! f32 BLOBs in `passage_vectors`. Vector search is brute-force cosine
//! similarity over every stored vector.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use econ_analyst_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use econ_analyst_core::models::Passage;
use econ_analyst_core::store::{query_terms, rank_candidates, PassageCandidate, PassageStore};

/// SQLite implementation of the [`PassageStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Build an FTS5 `MATCH` expression that ORs every query term.
///
/// Terms are quoted so that FTS5 operators in user text (`AND`, `NEAR`,
/// `*`) are matched literally. Returns `None` when the query has no terms.
pub fn fts_match_expr(query: &str) -> Option<String> {
    let mut terms = query_terms(query);
    terms.sort();
    terms.dedup();
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

#[async_trait]
impl PassageStore for SqliteStore {
    async fn replace_document(
        &self,
        document: &str,
        passages: &[Passage],
        vectors: Option<&[Vec<f32>]>,
        model: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM passage_vectors WHERE document = ?")
            .bind(document)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM passages_fts WHERE document = ?")
            .bind(document)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM passages WHERE document = ?")
            .bind(document)
            .execute(&mut *tx)
            .await?;

        for (i, passage) in passages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO passages (id, document, chunk_index, text, hash, indexed_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&passage.id)
            .bind(&passage.document)
            .bind(passage.chunk_index)
            .bind(&passage.text)
            .bind(&passage.hash)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO passages_fts (passage_id, document, text) VALUES (?, ?, ?)")
                .bind(&passage.id)
                .bind(&passage.document)
                .bind(&passage.text)
                .execute(&mut *tx)
                .await?;

            if let Some(vec) = vectors.and_then(|vecs| vecs.get(i)) {
                sqlx::query(
                    r#"
                    INSERT INTO passage_vectors (passage_id, document, model, dims, embedding)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&passage.id)
                .bind(document)
                .bind(model)
                .bind(vec.len() as i64)
                .bind(vec_to_blob(vec))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn keyword_search(&self, query: &str, limit: i64) -> Result<Vec<PassageCandidate>> {
        let Some(expr) = fts_match_expr(query) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT passage_id, document, text, rank
            FROM passages_fts
            WHERE passages_fts MATCH ?
            ORDER BY rank
            LIMIT ?
            "#,
        )
        .bind(&expr)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<PassageCandidate> = rows
            .iter()
            .map(|row| {
                let rank: f64 = row.get("rank");
                PassageCandidate {
                    passage_id: row.get("passage_id"),
                    document: row.get("document"),
                    text: row.get("text"),
                    score: -rank,
                }
            })
            .collect();

        rank_candidates(&mut candidates);
        Ok(candidates)
    }

    async fn vector_search(&self, query_vec: &[f32], limit: i64) -> Result<Vec<PassageCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT pv.passage_id, pv.document, pv.embedding, p.text
            FROM passage_vectors pv
            JOIN passages p ON p.id = pv.passage_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<PassageCandidate> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                PassageCandidate {
                    passage_id: row.get("passage_id"),
                    document: row.get("document"),
                    text: row.get("text"),
                    score: cosine_similarity(query_vec, &vec) as f64,
                }
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
    use crate::config::{Config, DbConfig};
    use crate::{db, migrate};
    use econ_analyst_core::chunk::chunk_document;
    use tempfile::TempDir;

    async fn open_store(tmp: &TempDir) -> SqliteStore {
        let mut config = Config::minimal();
        config.db = DbConfig {
            path: tmp.path().join("data").join("econ.sqlite"),
        };
        let pool = db::connect(&config).await.unwrap();
        migrate::migrate_pool(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    #[test]
    fn test_fts_match_expr() {
        assert_eq!(
            fts_match_expr("Inflation in Germany? inflation!").as_deref(),
            Some("\"germany\" OR \"in\" OR \"inflation\"")
        );
        assert_eq!(fts_match_expr("?!"), None);
    }

    #[tokio::test]
    async fn test_replace_and_keyword_search() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        assert_eq!(store.count().await.unwrap(), 0);

        let weo = chunk_document("weo", "Inflation in Germany eased in 2023.", 800, 150);
        let fed = chunk_document("fed", "Payroll growth slowed in the United States.", 800, 150);
        store.replace_document("weo", &weo, None, "").await.unwrap();
        store.replace_document("fed", &fed, None, "").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let hits = store.keyword_search("German inflation", 3).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].passage_id, "weo_chunk_0");
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_reingest_replaces_passages() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let first = chunk_document("weo", "Old outlook text.", 800, 150);
        let second = chunk_document("weo", "New outlook text.", 800, 150);
        store.replace_document("weo", &first, None, "").await.unwrap();
        store.replace_document("weo", &second, None, "").await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.keyword_search("old", 3).await.unwrap().is_empty());
        assert_eq!(store.keyword_search("new", 3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_vector_search_ranks_by_cosine() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let a = chunk_document("a", "labour market", 800, 150);
        let b = chunk_document("b", "price level", 800, 150);
        store
            .replace_document("a", &a, Some(&[vec![1.0, 0.0]][..]), "test")
            .await
            .unwrap();
        store
            .replace_document("b", &b, Some(&[vec![0.0, 1.0]][..]), "test")
            .await
            .unwrap();

        let hits = store.vector_search(&[0.1, 0.9], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "price level");
        assert!(hits[0].score > hits[1].score);
    }
}
