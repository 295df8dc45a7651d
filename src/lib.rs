//! # Econ Analyst
//!
//! A query-driven economic analysis assistant. A free-text question is
//! resolved to a country and a set of macro indicators, the indicator
//! series are fetched from the World Bank and summarized, report passages
//! are retrieved from a local index, and everything is synthesized into a
//! single narrative.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  World Bank  │──▶│   Analyst   │◀──│ SQLite index │
//! │   gateway    │   │ (fan-out +  │   │ FTS5 + vecs  │
//! └──────────────┘   │   join)     │   └──────▲───────┘
//!                    └──────┬──────┘          │
//!                           ▼                 │
//!                    ┌─────────────┐   ┌──────┴───────┐
//!                    │ Synthesizer │   │   ingest     │
//!                    │ (LLM calls) │   │ chunk+embed  │
//!                    └─────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! econ init
//! econ ingest reports/imf_weo_2024.txt
//! econ ask "What is Germany's inflation outlook?"
//! econ series DE FP.CPI.TOTL.ZG --limit 10
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | Persistent passage index |
//! | [`embedding`] | Embedding providers |
//! | [`generation`] | Text-generation providers |
//! | [`traits`] | Collaborator seams |
//! | [`gateway`] | World Bank series fetcher |
//! | [`synthesis`] | Prompted narrative generation |
//! | [`retrieve`] | Evidence retrieval |
//! | [`ingest`] | Report indexing |
//! | [`analysis`] | The analysis pipeline |
//!
//! Pure logic (resolution tables, series parsing, prompts, chunking) lives
//! in the `econ-analyst-core` crate.

pub mod analysis;
pub mod config;
pub mod db;
pub mod embedding;
pub mod gateway;
pub mod generation;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod retrieve;
pub mod sqlite_store;
pub mod synthesis;
pub mod traits;
