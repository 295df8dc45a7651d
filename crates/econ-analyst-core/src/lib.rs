//! # Econ Analyst Core
//!
//! Shared, I/O-free logic for Econ Analyst: query resolution, time-series
//! normalization, prompt construction, passage chunking, the embedding
//! trait, and the passage store abstraction.
//!
//! This crate contains no tokio, sqlx, reqwest, or filesystem I/O. The
//! application crate supplies the network gateways, the SQLite store, and
//! the orchestration that ties them together.

pub mod chunk;
pub mod embedding;
pub mod models;
pub mod prompt;
pub mod resolve;
pub mod series;
pub mod store;
