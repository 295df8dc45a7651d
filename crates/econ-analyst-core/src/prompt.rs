//! Prompt construction for the narrative synthesizer.
//!
//! Two prompt shapes are built here:
//!
//! - **Indicator summary**: a 2–3 sentence trend description of the most
//!   recent records of one series.
//! - **Final synthesis**: a 5–8 sentence analysis that integrates every
//!   indicator summary with the retrieved report excerpts.
//!
//! The evidence block is a single string: bullet-prefixed passages, or
//! [`NO_EVIDENCE`] when retrieval found nothing. Report renderers split it
//! back on the bullet prefix, so it must never become structured data.

use crate::models::SeriesRecord;

/// Prefix of each passage line in the evidence block.
pub const EVIDENCE_BULLET: &str = "- ";

/// Evidence block used when no passage was retrieved.
pub const NO_EVIDENCE: &str = "No relevant report excerpts found.";

/// Records shown to the model in an indicator summary prompt.
pub const SUMMARY_WINDOW: usize = 5;

/// Inputs to the final synthesis prompt.
#[derive(Debug, Clone)]
pub struct SynthesisContext<'a> {
    pub query: &'a str,
    pub country: &'a str,
    pub indicators: &'a [String],
    pub summaries: &'a [String],
    pub evidence: &'a str,
}

/// Format records as `"period: value"` lines, `None` for missing values.
pub fn format_records(records: &[SeriesRecord]) -> String {
    records
        .iter()
        .map(|r| match r.value {
            Some(v) => format!("{}: {}", r.period, v),
            None => format!("{}: None", r.period),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join passages into the evidence block, or return [`NO_EVIDENCE`].
pub fn format_evidence(passages: &[String]) -> String {
    if passages.is_empty() {
        return NO_EVIDENCE.to_string();
    }

    let mut block = String::new();
    for passage in passages {
        block.push_str(EVIDENCE_BULLET);
        block.push_str(passage.trim());
        block.push('\n');
    }
    block
}

/// Build the per-indicator trend summary prompt.
///
/// Only the first [`SUMMARY_WINDOW`] records are included; callers pass
/// the series latest-first.
pub fn indicator_summary_prompt(country: &str, indicator: &str, records: &[SeriesRecord]) -> String {
    let window = &records[..records.len().min(SUMMARY_WINDOW)];
    format!(
        r#"You are an economic analyst.

Given the following data for country {country} and indicator {indicator},
write a short 2–3 sentence summary describing the trend, direction,
and any notable movements.

Data:
{data}

Summary:
"#,
        country = country,
        indicator = indicator,
        data = format_records(window),
    )
}

/// Build the final synthesis prompt.
pub fn synthesis_prompt(ctx: &SynthesisContext<'_>) -> String {
    let indicators = ctx
        .indicators
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"User question:
"{query}"

Country detected: {country}
Indicators analyzed: [{indicators}]

=== MACRO TREND SUMMARIES ===
{summaries}

=== EXCERPTS FROM ECONOMIC REPORTS ===
{evidence}

Based on BOTH the macroeconomic data AND the report excerpts,
write a final combined economic analysis (5–8 sentences).

Your answer should:
- integrate the macro trends,
- integrate the report context,
- explain risks, drivers, and outlook,
- avoid repeating raw data verbatim,
- sound like a professional economic analyst.
"#,
        query = ctx.query,
        country = ctx.country,
        indicators = indicators,
        summaries = ctx.summaries.join("\n"),
        evidence = ctx.evidence.trim_end(),
    )
}
