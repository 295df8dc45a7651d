//! # Econ Analyst CLI (`econ`)
//!
//! ## Usage
//!
//! ```bash
//! econ --config ./config/econ.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `econ init` | Create the SQLite index and schema |
//! | `econ ask "<query>"` | Run the full analysis pipeline |
//! | `econ series <country> <indicator>` | Fetch one indicator series |
//! | `econ evidence "<query>"` | Show the passages retrieval returns |
//! | `econ ingest <files...>` | Index report text files |

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use econ_analyst::analysis::{AnalysisSettings, Analyst};
use econ_analyst::config::{self, Config};
use econ_analyst::gateway::WorldBankGateway;
use econ_analyst::generation::create_generator;
use econ_analyst::retrieve::EvidenceRetriever;
use econ_analyst::sqlite_store::SqliteStore;
use econ_analyst::synthesis::Synthesizer;
use econ_analyst::traits::MacroDataSource;
use econ_analyst::{db, embedding, ingest, logging, migrate};
use econ_analyst_core::models::IndicatorSeries;
use econ_analyst_core::prompt::format_records;

/// Econ Analyst: macro indicators plus report evidence, synthesized into
/// an economic narrative.
#[derive(Parser)]
#[command(
    name = "econ",
    about = "Economic analysis from World Bank indicators and report excerpts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/econ.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the passage index schema. Safe to run repeatedly.
    Init,

    /// Answer a free-text economic question.
    Ask {
        /// The question, e.g. "What is Germany's inflation outlook?"
        query: String,

        /// Country code used when the question names no country.
        #[arg(long)]
        country: Option<String>,

        /// Print the full result as JSON instead of the narrative.
        #[arg(long)]
        json: bool,
    },

    /// Fetch a single indicator series.
    Series {
        /// Country code, e.g. `DE`.
        country: String,

        /// Indicator code, e.g. `FP.CPI.TOTL.ZG`.
        indicator: String,

        /// Show only the most recent N records.
        #[arg(long)]
        limit: Option<usize>,

        /// Drop periods without a value.
        #[arg(long)]
        observed: bool,

        /// Also print a generated trend summary.
        #[arg(long)]
        summarize: bool,
    },

    /// Retrieve report passages for a query.
    Evidence {
        query: String,

        /// Maximum number of passages (defaults to `analysis.evidence_count`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Index UTF-8 text files into the passage store.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(&cfg.logging.level, &cfg.logging.format);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::Ask {
            query,
            country,
            json,
        } => {
            let pool = open_index(&cfg).await?;
            let analyst = build_analyst(&cfg, pool.clone())?;
            let result = analyst.analyze(&query, country.as_deref()).await?;
            pool.close().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Country: {}", result.country);
                println!("Indicators: {}", result.indicators_used.join(", "));
                println!();
                println!("{}", result.analysis.trim());
                for failure in &result.indicator_errors {
                    eprintln!("warning: {}: {}", failure.indicator, failure.error);
                }
            }
        }
        Commands::Series {
            country,
            indicator,
            limit,
            observed,
            summarize,
        } => {
            let gateway = WorldBankGateway::new(&cfg.gateway)?;
            let series = gateway
                .fetch_series(&country.to_uppercase(), &indicator)
                .await?;

            let mut records = if observed {
                series.observed()
            } else {
                series.records().to_vec()
            };
            if let Some(n) = limit {
                records.truncate(n);
            }

            if records.is_empty() {
                println!("No records.");
            } else {
                println!("{}", format_records(&records));
            }

            if summarize {
                // Summarize exactly the records shown above.
                let shown = IndicatorSeries::new(
                    series.country.clone(),
                    series.indicator.clone(),
                    records,
                );
                let synthesizer = Synthesizer::new(create_generator(&cfg.generation)?);
                let summary = synthesizer.summarize_indicator(&shown).await?;
                println!();
                println!("{}", summary.trim());
            }
        }
        Commands::Evidence { query, limit } => {
            let pool = open_index(&cfg).await?;
            let retriever = build_retriever(&cfg, pool.clone())?;
            let n = limit.unwrap_or(cfg.analysis.evidence_count);
            let candidates = retriever.candidates(&query, n).await?;
            pool.close().await;

            if candidates.is_empty() {
                println!("No results.");
            }
            for (i, c) in candidates.iter().enumerate() {
                println!("{}. [{:.3}] {} ({})", i + 1, c.score, c.document, c.passage_id);
                println!("   {}", c.text.replace('\n', " "));
            }
        }
        Commands::Ingest { files } => {
            let pool = open_index(&cfg).await?;
            let store = SqliteStore::new(pool.clone());
            let embedder = embedding::create_provider(&cfg.embedding)?;
            let reports = ingest::ingest_files(&cfg, &store, embedder.as_ref(), &files).await?;
            pool.close().await;

            let chunks: usize = reports.iter().map(|r| r.chunks).sum();
            if chunks == 0 {
                println!("no documents found");
            } else {
                println!("ingested {} chunks", chunks);
            }
        }
    }

    Ok(())
}

/// Open the database, making sure the schema exists.
async fn open_index(cfg: &Config) -> Result<SqlitePool> {
    let pool = db::connect(cfg).await?;
    migrate::migrate_pool(&pool).await?;
    Ok(pool)
}

fn build_retriever(cfg: &Config, pool: SqlitePool) -> Result<EvidenceRetriever> {
    let store = Arc::new(SqliteStore::new(pool));
    let embedder = embedding::create_provider(&cfg.embedding)?;
    EvidenceRetriever::new(store, embedder, &cfg.retrieval)
}

fn build_analyst(cfg: &Config, pool: SqlitePool) -> Result<Analyst> {
    let gateway = Arc::new(WorldBankGateway::new(&cfg.gateway)?);
    let retriever = Arc::new(build_retriever(cfg, pool)?);
    let synthesizer = Synthesizer::new(create_generator(&cfg.generation)?);
    Ok(Analyst::new(
        gateway,
        retriever,
        synthesizer,
        AnalysisSettings::from(&cfg.analysis),
    ))
}
