//! Seams between the analysis orchestrator and its collaborators.
//!
//! ```text
//!                 ┌──────────────┐
//!   query ──────▶ │   Analyst    │ ─────▶ AnalysisResult
//!                 └──┬────┬────┬─┘
//!                    │    │    │
//!      MacroDataSource  EvidenceSource  TextGenerator
//!      (WorldBank)      (SQLite index)  (OpenAI chat)
//! ```
//!
//! Each trait is object-safe and `Send + Sync` so the orchestrator can hold
//! `Arc<dyn ...>` handles and share them across concurrent tasks. Tests
//! substitute in-process fakes.

use anyhow::Result;
use async_trait::async_trait;

use econ_analyst_core::models::IndicatorSeries;
use econ_analyst_core::series::FetchError;

/// A source of country-level indicator time series.
#[async_trait]
pub trait MacroDataSource: Send + Sync {
    /// Fetch one series, sorted latest first.
    ///
    /// Every failure is a [`FetchError`]; callers degrade it instead of
    /// aborting the surrounding analysis.
    async fn fetch_series(
        &self,
        country: &str,
        indicator: &str,
    ) -> Result<IndicatorSeries, FetchError>;
}

/// A source of report passages relevant to a free-text query.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Up to `n` passage texts, most relevant first. An empty index yields
    /// an empty list, not an error.
    async fn search(&self, query: &str, n: usize) -> Result<Vec<String>>;
}

/// A text-completion backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier used for logging.
    fn model_name(&self) -> &str;

    /// Complete `prompt`, returning the generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
