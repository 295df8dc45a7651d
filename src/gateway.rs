//! World Bank indicator gateway.
//!
//! Fetches `GET {base_url}/country/{country}/indicator/{indicator}?format=json`
//! and hands the body to [`econ_analyst_core::series::parse_body`]. A single
//! page is requested; `gateway.per_page` widens it when the default page
//! is too short for a series.

use async_trait::async_trait;
use std::time::Duration;

use econ_analyst_core::models::IndicatorSeries;
use econ_analyst_core::series::{parse_body, FetchError};

use crate::config::GatewayConfig;
use crate::traits::MacroDataSource;

/// HTTP client for the World Bank v2 indicator API.
#[derive(Clone)]
pub struct WorldBankGateway {
    client: reqwest::Client,
    base_url: String,
    per_page: Option<u32>,
}

impl WorldBankGateway {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
        })
    }

    /// The request URL for one (country, indicator) pair, without query string.
    pub fn series_url(&self, country: &str, indicator: &str) -> String {
        format!(
            "{}/country/{}/indicator/{}",
            self.base_url, country, indicator
        )
    }
}

#[async_trait]
impl MacroDataSource for WorldBankGateway {
    async fn fetch_series(
        &self,
        country: &str,
        indicator: &str,
    ) -> Result<IndicatorSeries, FetchError> {
        let url = self.series_url(country, indicator);

        let mut query: Vec<(&str, String)> = vec![("format", "json".to_string())];
        if let Some(per_page) = self.per_page {
            query.push(("per_page", per_page.to_string()));
        }

        tracing::debug!(%country, %indicator, %url, "fetching series");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let records = parse_body(&body)?;
        tracing::debug!(%country, %indicator, records = records.len(), "series fetched");

        Ok(IndicatorSeries::new(country, indicator, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_url() {
        let gw = WorldBankGateway::new(&GatewayConfig {
            base_url: "https://api.worldbank.org/v2/".to_string(),
            per_page: None,
            timeout_secs: Some(10),
        })
        .unwrap();
        assert_eq!(
            gw.series_url("DE", "FP.CPI.TOTL.ZG"),
            "https://api.worldbank.org/v2/country/DE/indicator/FP.CPI.TOTL.ZG"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let gw = WorldBankGateway::new(&GatewayConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            per_page: None,
            timeout_secs: Some(5),
        })
        .unwrap();
        let err = gw.fetch_series("US", "NY.GDP.MKTP.KD.ZG").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
