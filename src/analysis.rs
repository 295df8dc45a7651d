//! Analysis orchestrator.
//!
//! ```text
//! query ─▶ resolve country ─▶ resolve indicators
//!              │
//!              ├─▶ per indicator (bounded, concurrent):
//!              │      fetch_series ─▶ summarize │ degraded string
//!              └─▶ evidence search (concurrent with the above)
//!                              │
//!                              ▼
//!                      final synthesis ─▶ AnalysisResult
//! ```
//!
//! Indicators are processed in sorted code order and every task writes
//! only its own slot, so the output order never depends on task timing.
//! Data-source failures degrade; generation failures fail the request.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use econ_analyst_core::models::{AnalysisResult, IndicatorData, IndicatorFailure, SeriesRecord};
use econ_analyst_core::prompt::{format_evidence, SynthesisContext};
use econ_analyst_core::resolve::{resolve_country, resolve_indicators};
use econ_analyst_core::series::FetchError;

use crate::config::AnalysisConfig;
use crate::synthesis::Synthesizer;
use crate::traits::{EvidenceSource, MacroDataSource};

/// Tunables for one [`Analyst`].
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub default_country: String,
    pub head_count: usize,
    pub evidence_count: usize,
    pub max_concurrency: usize,
}

impl From<&AnalysisConfig> for AnalysisSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            default_country: config.default_country.clone(),
            head_count: config.head_count,
            evidence_count: config.evidence_count,
            max_concurrency: config.max_concurrency,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

enum IndicatorOutcome {
    Summarized {
        summary: String,
        head: Vec<SeriesRecord>,
    },
    Failed(FetchError),
}

/// The top-level pipeline. Holds only shared handles, so one instance can
/// serve concurrent requests.
#[derive(Clone)]
pub struct Analyst {
    data: Arc<dyn MacroDataSource>,
    evidence: Arc<dyn EvidenceSource>,
    synthesizer: Synthesizer,
    settings: AnalysisSettings,
}

impl Analyst {
    pub fn new(
        data: Arc<dyn MacroDataSource>,
        evidence: Arc<dyn EvidenceSource>,
        synthesizer: Synthesizer,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            data,
            evidence,
            synthesizer,
            settings,
        }
    }

    /// Answer `query`, using `country_hint` when the query names no country.
    ///
    /// Returns a complete result, possibly with degraded per-indicator
    /// summaries, or the first generation error.
    pub async fn analyze(&self, query: &str, country_hint: Option<&str>) -> Result<AnalysisResult> {
        let default = country_hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(self.settings.default_country.as_str());
        let country = resolve_country(query, default).to_uppercase();
        let indicators: Vec<String> = resolve_indicators(query).into_iter().collect();

        tracing::info!(%country, indicators = ?indicators, "analysis started");

        let (outcomes, passages) = tokio::join!(
            self.process_indicators(&country, &indicators),
            self.gather_evidence(query)
        );
        let outcomes = outcomes?;

        let mut raw_summaries = Vec::with_capacity(indicators.len());
        let mut raw_data = Vec::new();
        let mut indicator_errors = Vec::new();

        for (indicator, outcome) in indicators.iter().zip(outcomes) {
            match outcome {
                IndicatorOutcome::Summarized { summary, head } => {
                    raw_summaries.push(format!("Indicator {}:\n{}", indicator, summary));
                    raw_data.push(IndicatorData {
                        indicator: indicator.clone(),
                        values: head,
                    });
                }
                IndicatorOutcome::Failed(err) => {
                    tracing::warn!(%country, %indicator, error = %err, "indicator degraded");
                    raw_summaries.push(format!("Error fetching {}: {}", indicator, err));
                    indicator_errors.push(IndicatorFailure {
                        indicator: indicator.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let rag_passages = format_evidence(&passages);

        let analysis = self
            .synthesizer
            .final_analysis(&SynthesisContext {
                query,
                country: &country,
                indicators: &indicators,
                summaries: &raw_summaries,
                evidence: &rag_passages,
            })
            .await?;

        tracing::info!(
            %country,
            summaries = raw_summaries.len(),
            failures = indicator_errors.len(),
            passages = passages.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            country,
            indicators_used: indicators,
            analysis,
            rag_passages,
            raw_summaries,
            raw_data,
            indicator_errors,
        })
    }

    /// Fetch and summarize every indicator, at most `max_concurrency` at a
    /// time. The returned outcomes are in `indicators` order.
    async fn process_indicators(
        &self,
        country: &str,
        indicators: &[String],
    ) -> Result<Vec<IndicatorOutcome>> {
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (slot, indicator) in indicators.iter().enumerate() {
            let permits = permits.clone();
            let data = self.data.clone();
            let synthesizer = self.synthesizer.clone();
            let country = country.to_string();
            let indicator = indicator.clone();
            let head_count = self.settings.head_count;

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| anyhow!("indicator worker pool closed: {}", e))?;

                let outcome = match data.fetch_series(&country, &indicator).await {
                    Ok(series) => {
                        let summary = synthesizer.summarize_indicator(&series).await?;
                        IndicatorOutcome::Summarized {
                            summary,
                            head: series.head(head_count),
                        }
                    }
                    Err(err) => IndicatorOutcome::Failed(err),
                };
                Ok::<_, anyhow::Error>((slot, outcome))
            });
        }

        let mut slots: Vec<Option<IndicatorOutcome>> =
            std::iter::repeat_with(|| None).take(indicators.len()).collect();

        // Dropping `tasks` on an early return aborts the remaining workers.
        while let Some(joined) = tasks.join_next().await {
            let (slot, outcome) = joined.map_err(|e| anyhow!("indicator task failed: {}", e))??;
            slots[slot] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|s| s.ok_or_else(|| anyhow!("indicator task produced no result")))
            .collect()
    }

    async fn gather_evidence(&self, query: &str) -> Vec<String> {
        match self.evidence.search(query, self.settings.evidence_count).await {
            Ok(passages) => passages,
            Err(e) => {
                tracing::warn!(error = %e, "evidence retrieval failed, continuing without passages");
                Vec::new()
            }
        }
    }
}
