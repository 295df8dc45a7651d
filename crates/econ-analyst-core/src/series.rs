//! Time-series envelope parsing and normalization.
//!
//! The statistics service answers with a two-element JSON array:
//!
//! ```text
//! [ { "page": 1, "pages": 2, "per_page": 50, "total": 64, ... },
//!   [ { "date": "2023", "value": 5.9, ... }, ... ] ]
//! ```
//!
//! [`parse_envelope`] validates that shape, keeps only `(date, value)`
//! pairs, coerces values forgivingly, and sorts latest first. The HTTP
//! transport lives in the application crate; this module only sees JSON.

use serde_json::Value;
use thiserror::Error;

use crate::models::SeriesRecord;

/// Recoverable failures of a single series fetch.
///
/// All variants are degraded into a per-indicator summary string by the
/// orchestrator; none aborts an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The service answered with a non-success status code.
    #[error("Failed to fetch data: HTTP {0}")]
    Http(u16),
    /// The body was not the expected `[metadata, data[]]` envelope.
    #[error("Invalid API response structure: {0}")]
    MalformedResponse(String),
    /// The request never produced a response (connect, timeout, body read).
    #[error("Failed to reach data service: {0}")]
    Transport(String),
}

/// Parse a raw response body into sorted records.
pub fn parse_body(body: &str) -> Result<Vec<SeriesRecord>, FetchError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("body is not JSON: {}", e)))?;
    parse_envelope(&json)
}

/// Validate the two-element envelope and extract its records.
///
/// Entries without a string `date` are skipped. The returned records are
/// sorted by period descending.
pub fn parse_envelope(json: &Value) -> Result<Vec<SeriesRecord>, FetchError> {
    let parts = json
        .as_array()
        .ok_or_else(|| FetchError::MalformedResponse("expected a JSON array".to_string()))?;

    if parts.len() < 2 {
        return Err(FetchError::MalformedResponse(format!(
            "expected [metadata, data], got {} element(s)",
            parts.len()
        )));
    }

    let data = parts[1].as_array().ok_or_else(|| {
        FetchError::MalformedResponse("second element is not a data array".to_string())
    })?;

    let records = data
        .iter()
        .filter_map(|entry| {
            let period = entry.get("date")?.as_str()?;
            let value = entry.get("value").and_then(coerce_value);
            Some(SeriesRecord::new(period, value))
        })
        .collect();

    Ok(normalize_records(records))
}

/// Coerce an upstream value to a number.
///
/// Numbers pass through, numeric strings are parsed, and anything else
/// (null, empty or non-numeric strings, non-finite values) becomes missing.
pub fn coerce_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Sort records by period descending (latest first).
///
/// Periods compare as strings, which orders `"2023"`, `"2023Q4"` and
/// `"2023M12"` labels correctly within one series. The sort is stable, so
/// feeding an already-sorted series back in returns it unchanged.
pub fn normalize_records(mut records: Vec<SeriesRecord>) -> Vec<SeriesRecord> {
    records.sort_by(|a, b| b.period.cmp(&a.period));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(data: Value) -> Value {
        json!([{ "page": 1, "pages": 1, "per_page": 50, "total": 3 }, data])
    }

    #[test]
    fn test_parse_sorts_descending() {
        let json = envelope(json!([
            { "date": "2021", "value": 3.1 },
            { "date": "2023", "value": 5.9 },
            { "date": "2022", "value": 8.7 },
        ]));
        let records = parse_envelope(&json).unwrap();
        let periods: Vec<&str> = records.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2023", "2022", "2021"]);
        assert_eq!(records[0].value, Some(5.9));
    }

    #[test]
    fn test_parse_keeps_only_date_and_value() {
        let json = envelope(json!([{
            "indicator": { "id": "FP.CPI.TOTL.ZG", "value": "Inflation" },
            "country": { "id": "DE", "value": "Germany" },
            "countryiso3code": "DEU",
            "date": "2023",
            "value": "5.9",
            "unit": "",
            "obs_status": "",
            "decimal": 1
        }]));
        let records = parse_envelope(&json).unwrap();
        assert_eq!(records, vec![SeriesRecord::new("2023", Some(5.9))]);
    }

    #[test]
    fn test_non_numeric_values_become_missing() {
        let json = envelope(json!([
            { "date": "2023", "value": null },
            { "date": "2022", "value": ".." },
            { "date": "2021", "value": "" },
            { "date": "2020", "value": "1.5" },
            { "date": "2019" },
        ]));
        let records = parse_envelope(&json).unwrap();
        let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![None, None, None, Some(1.5), None]);
    }

    #[test]
    fn test_entries_without_date_are_skipped() {
        let json = envelope(json!([
            { "value": 1.0 },
            { "date": 2020, "value": 2.0 },
            { "date": "2019", "value": 3.0 },
        ]));
        let records = parse_envelope(&json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, "2019");
    }

    #[test]
    fn test_single_element_envelope_is_malformed() {
        let json = json!([{ "message": [{ "id": "120", "key": "Invalid value" }] }]);
        let err = parse_envelope(&json).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_non_array_shapes_are_malformed() {
        for json in [json!({}), json!("text"), json!(null), json!([{}, null]), json!([{}, {}])] {
            assert!(
                matches!(parse_envelope(&json), Err(FetchError::MalformedResponse(_))),
                "expected malformed for {json}"
            );
        }
    }

    #[test]
    fn test_parse_body_rejects_non_json() {
        let err = parse_body("<html>error</html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_empty_data_array_is_valid() {
        let records = parse_envelope(&envelope(json!([]))).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_records(vec![
            SeriesRecord::new("2019", Some(1.0)),
            SeriesRecord::new("2021", None),
            SeriesRecord::new("2020", Some(2.0)),
        ]);
        let twice = normalize_records(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value(&json!(2.5)), Some(2.5));
        assert_eq!(coerce_value(&json!(" -0.75 ")), Some(-0.75));
        assert_eq!(coerce_value(&json!("NaN")), None);
        assert_eq!(coerce_value(&json!(true)), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::Http(503).to_string(),
            "Failed to fetch data: HTTP 503"
        );
    }

    use proptest::prelude::*;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
            "[0-9a-z. ]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::hash_map("date|value|page|[a-z]{1,4}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_records() -> impl Strategy<Value = Vec<SeriesRecord>> {
        prop::collection::vec(
            ("[0-9]{4}(Q[1-4]|M[01][0-9])?", prop::option::of(-100.0f64..100.0))
                .prop_map(|(period, value)| SeriesRecord::new(period, value)),
            0..24,
        )
    }

    proptest! {
        #[test]
        fn proptest_parse_envelope_total_on_any_json(json in arb_json()) {
            if let Ok(records) = parse_envelope(&json) {
                prop_assert!(records.windows(2).all(|w| w[0].period >= w[1].period));
            }
        }

        #[test]
        fn proptest_any_data_array_parses(entries in prop::collection::vec(arb_json(), 0..8)) {
            let json = envelope(Value::Array(entries));
            prop_assert!(parse_envelope(&json).is_ok());
        }

        #[test]
        fn proptest_parse_body_total_on_any_text(body in ".{0,64}") {
            let _ = parse_body(&body);
        }

        #[test]
        fn proptest_normalize_sorted_and_idempotent(records in arb_records()) {
            let once = normalize_records(records.clone());
            prop_assert_eq!(once.len(), records.len());
            prop_assert!(once.windows(2).all(|w| w[0].period >= w[1].period));
            let twice = normalize_records(once.clone());
            prop_assert_eq!(twice, once);
        }
    }
}
