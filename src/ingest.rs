//! Indexing of report text into the passage store.
//!
//! Text → overlapping chunks → (optional) embeddings → atomic replace of the
//! document's passages. Embedding failure is non-fatal: passages are still
//! stored and stay reachable through keyword retrieval.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use econ_analyst_core::chunk::chunk_document;
use econ_analyst_core::embedding::EmbeddingProvider;
use econ_analyst_core::store::PassageStore;

use crate::config::{ChunkingConfig, Config};
use crate::embedding::embed_batched;

/// Outcome of indexing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub document: String,
    pub chunks: usize,
    /// Passages stored with a vector. Zero when embeddings are disabled or failed.
    pub embedded: usize,
}

/// Chunk, embed and store one document, replacing any earlier version.
pub async fn index_document(
    store: &dyn PassageStore,
    embedder: &dyn EmbeddingProvider,
    chunking: &ChunkingConfig,
    batch_size: usize,
    document: &str,
    text: &str,
) -> Result<IngestReport> {
    let passages = chunk_document(
        document,
        text,
        chunking.chunk_size,
        chunking.chunk_overlap,
    );

    let vectors = if embedder.is_enabled() && !passages.is_empty() {
        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        match embed_batched(embedder, &texts, batch_size).await {
            Ok(vecs) => Some(vecs),
            Err(e) => {
                tracing::warn!(%document, error = %e, "embedding failed, storing passages without vectors");
                None
            }
        }
    } else {
        None
    };

    store
        .replace_document(document, &passages, vectors.as_deref(), embedder.model_name())
        .await
        .with_context(|| format!("Failed to index document '{}'", document))?;

    let report = IngestReport {
        document: document.to_string(),
        chunks: passages.len(),
        embedded: vectors.map(|v| v.len()).unwrap_or(0),
    };
    tracing::info!(
        document = %report.document,
        chunks = report.chunks,
        embedded = report.embedded,
        "document indexed"
    );
    Ok(report)
}

/// Document id for a file: its stem, or the full name when it has none.
pub fn document_id(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Map each file to its document id, rejecting ids shared by two files.
///
/// Runs before anything is written, so a rejected batch leaves the index
/// untouched.
fn assign_document_ids(files: &[PathBuf]) -> Result<Vec<(String, &PathBuf)>> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    let mut assigned = Vec::with_capacity(files.len());
    for path in files {
        let id = document_id(path);
        if let Some(previous) = seen.get(&id) {
            if *previous != path {
                bail!(
                    "{} and {} both map to document id '{}'; rename one of them",
                    previous.display(),
                    path.display(),
                    id
                );
            }
            continue;
        }
        seen.insert(id.clone(), path);
        assigned.push((id, path));
    }
    Ok(assigned)
}

/// Index UTF-8 text files. Returns one report per distinct file, in input
/// order. A file listed twice is indexed once.
pub async fn ingest_files(
    config: &Config,
    store: &dyn PassageStore,
    embedder: &dyn EmbeddingProvider,
    files: &[PathBuf],
) -> Result<Vec<IngestReport>> {
    let assigned = assign_document_ids(files)?;

    let mut reports = Vec::with_capacity(assigned.len());
    for (id, path) in assigned {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = index_document(
            store,
            embedder,
            &config.chunking,
            config.embedding.batch_size,
            &id,
            &text,
        )
        .await?;
        reports.push(report);
    }
    Ok(reports)
}
