//! Core data models used throughout Econ Analyst.
//!
//! These types represent the time series, passages, and analysis results
//! that flow through the resolution → fetch → retrieve → synthesize
//! pipeline. All of them are created per request and never persisted by
//! the pipeline itself.

use serde::{Deserialize, Serialize};

/// One observation of an indicator: a period label and its value.
///
/// `value` is `None` when the upstream source returned a non-numeric
/// placeholder. Serializes as `{"date": ..., "value": ...}`, the shape the
/// presentation layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[serde(rename = "date")]
    pub period: String,
    pub value: Option<f64>,
}

impl SeriesRecord {
    pub fn new(period: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }
}

/// A fetched time series for one (country, indicator) pair.
///
/// Records are sorted by period descending (latest first). The series is
/// never mutated after construction; [`head`](IndicatorSeries::head) and
/// [`observed`](IndicatorSeries::observed) return copies.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub country: String,
    pub indicator: String,
    records: Vec<SeriesRecord>,
}

impl IndicatorSeries {
    /// Wrap already-normalized records. Callers should go through
    /// [`crate::series::normalize_records`] first.
    pub fn new(
        country: impl Into<String>,
        indicator: impl Into<String>,
        records: Vec<SeriesRecord>,
    ) -> Self {
        Self {
            country: country.into(),
            indicator: indicator.into(),
            records,
        }
    }

    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `n` most recent records, copied.
    pub fn head(&self, n: usize) -> Vec<SeriesRecord> {
        self.records.iter().take(n).cloned().collect()
    }

    /// Records that carry a numeric value, copied. Used for charting.
    pub fn observed(&self) -> Vec<SeriesRecord> {
        self.records
            .iter()
            .filter(|r| r.value.is_some())
            .cloned()
            .collect()
    }
}

/// A chunk of an ingested document, as stored in the similarity index.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// `"{document}_chunk_{index}"`, unique across the index.
    pub id: String,
    pub document: String,
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// Head of one indicator's series included in an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorData {
    pub indicator: String,
    pub values: Vec<SeriesRecord>,
}

/// A per-indicator fetch failure that was degraded into a summary string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFailure {
    pub indicator: String,
    pub error: String,
}

/// The orchestrator's response for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Upper-cased country code the analysis was run for.
    pub country: String,
    /// Every resolved indicator code, in processing order.
    pub indicators_used: Vec<String>,
    /// Final synthesized narrative.
    pub analysis: String,
    /// Bullet-joined evidence passages, or the "not found" sentinel.
    pub rag_passages: String,
    /// One entry per indicator: a trend summary or a degraded error string.
    pub raw_summaries: Vec<String>,
    /// Truncated series for indicators whose fetch succeeded.
    pub raw_data: Vec<IndicatorData>,
    /// Structured view of the degraded entries in `raw_summaries`.
    #[serde(default)]
    pub indicator_errors: Vec<IndicatorFailure>,
}
