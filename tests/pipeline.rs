//! End-to-end pipeline tests against a mock World Bank server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tempfile::TempDir;

use econ_analyst::analysis::{AnalysisSettings, Analyst};
use econ_analyst::config::{Config, DbConfig, GatewayConfig, RetrievalConfig};
use econ_analyst::embedding::DisabledProvider;
use econ_analyst::gateway::WorldBankGateway;
use econ_analyst::ingest::index_document;
use econ_analyst::retrieve::EvidenceRetriever;
use econ_analyst::sqlite_store::SqliteStore;
use econ_analyst::synthesis::Synthesizer;
use econ_analyst::traits::{MacroDataSource, TextGenerator};
use econ_analyst::{db, migrate};
use econ_analyst_core::resolve::{CPI_INFLATION, GDP_GROWTH, UNEMPLOYMENT};
use econ_analyst_core::series::FetchError;

// ============ Mock World Bank ============

async fn indicator(
    Path((country, code)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if params.get("format").map(String::as_str) != Some("json") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "format" })));
    }

    match code.as_str() {
        CPI_INFLATION => (
            StatusCode::OK,
            Json(json!([
                { "page": 1, "pages": 1, "per_page": 50, "total": 7 },
                [
                    { "date": "2019", "value": 1.4, "country": { "id": country } },
                    { "date": "2023", "value": "5.9" },
                    { "date": "2021", "value": 3.1 },
                    { "date": "2024", "value": null },
                    { "date": "2022", "value": 6.9 },
                    { "date": "2020", "value": 0.5 },
                    { "date": "2018", "value": 1.7 }
                ]
            ])),
        ),
        GDP_GROWTH => (
            StatusCode::OK,
            Json(json!([
                { "message": [{ "id": "120", "value": "Invalid value" }] }
            ])),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "unavailable" })),
        ),
    }
}

async fn spawn_mock_worldbank() -> String {
    let app = Router::new().route("/v2/country/{country}/indicator/{code}", get(indicator));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v2", addr)
}

fn gateway(base_url: String) -> WorldBankGateway {
    WorldBankGateway::new(&GatewayConfig {
        base_url,
        per_page: Some(100),
        timeout_secs: Some(10),
    })
    .unwrap()
}

// ============ Generator double ============

#[derive(Default)]
struct Scripted {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for Scripted {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.starts_with("User question:") {
            Ok("German inflation is retreating from its 2022 peak.".to_string())
        } else {
            Ok("Inflation peaked in 2022 and has since eased.".to_string())
        }
    }
}

// ============ Gateway ============

#[tokio::test]
async fn test_gateway_sorts_and_coerces() {
    let gw = gateway(spawn_mock_worldbank().await);
    let series = gw.fetch_series("DE", CPI_INFLATION).await.unwrap();

    let periods: Vec<&str> = series.records().iter().map(|r| r.period.as_str()).collect();
    assert_eq!(
        periods,
        vec!["2024", "2023", "2022", "2021", "2020", "2019", "2018"]
    );
    assert_eq!(series.records()[0].value, None);
    assert_eq!(series.records()[1].value, Some(5.9));
    assert_eq!(series.observed().len(), 6);
    assert_eq!(series.head(3).len(), 3);
    assert_eq!(series.len(), 7);
}

#[tokio::test]
async fn test_gateway_single_element_envelope_is_malformed() {
    let gw = gateway(spawn_mock_worldbank().await);
    let err = gw.fetch_series("DE", GDP_GROWTH).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn test_gateway_http_error() {
    let gw = gateway(spawn_mock_worldbank().await);
    let err = gw.fetch_series("DE", UNEMPLOYMENT).await.unwrap_err();
    assert_eq!(err, FetchError::Http(500));
}

// ============ Full pipeline ============

#[tokio::test]
async fn test_analyze_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::minimal();
    config.db = DbConfig {
        path: tmp.path().join("econ.sqlite"),
    };

    let pool = db::connect(&config).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    let store = Arc::new(SqliteStore::new(pool));

    index_document(
        store.as_ref(),
        &DisabledProvider,
        &config.chunking,
        config.embedding.batch_size,
        "bundesbank_2024",
        "German inflation eased in 2024 as energy prices fell.\n\nCore inflation remains sticky.",
    )
    .await
    .unwrap();

    let retriever = EvidenceRetriever::new(
        store,
        Arc::new(DisabledProvider),
        &RetrievalConfig::default(),
    )
    .unwrap();

    let generator = Arc::new(Scripted::default());
    let analyst = Analyst::new(
        Arc::new(gateway(spawn_mock_worldbank().await)),
        Arc::new(retriever),
        Synthesizer::new(generator.clone()),
        AnalysisSettings::default(),
    );

    let result = analyst
        .analyze("inflation and gdp in Germany", None)
        .await
        .unwrap();

    assert_eq!(result.country, "DE");
    assert_eq!(
        result.indicators_used,
        vec![CPI_INFLATION.to_string(), GDP_GROWTH.to_string()]
    );
    assert_eq!(
        result.analysis,
        "German inflation is retreating from its 2022 peak."
    );

    // CPI succeeded, GDP degraded.
    assert_eq!(result.raw_data.len(), 1);
    assert_eq!(result.raw_data[0].indicator, CPI_INFLATION);
    assert_eq!(result.raw_data[0].values.len(), 5);
    assert_eq!(result.raw_data[0].values[0].period, "2024");
    assert!(result.raw_summaries[0].starts_with(&format!("Indicator {}:\n", CPI_INFLATION)));
    assert!(result.raw_summaries[1]
        .starts_with(&format!("Error fetching {}: Invalid API response structure", GDP_GROWTH)));
    assert_eq!(result.indicator_errors.len(), 1);

    assert!(result.rag_passages.starts_with("- "));
    assert!(result.rag_passages.contains("energy prices fell"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["raw_data"][0]["values"][0]["date"], "2024");
    assert!(json["raw_data"][0]["values"][0]["value"].is_null());
    assert_eq!(json["raw_data"][0]["values"][1]["value"], 5.9);

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    let final_prompt = prompts.last().unwrap();
    assert!(final_prompt.contains("Country detected: DE"));
    assert!(final_prompt.contains("energy prices fell"));
}
