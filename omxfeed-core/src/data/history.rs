//! Price history: the chart-data JSON envelope and the series payload.

use super::provider::DataError;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Status value the feed uses for a successful history query.
const STATUS_OK: i64 = 1;

/// One closing-price sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub value: f64,
    /// `timestamp` as a UTC calendar timestamp.
    pub datetime: NaiveDateTime,
}

/// A company's price history over the requested range.
///
/// This is the payload stored in price-series cache files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Full company name (`instData.@fnm`).
    pub company: String,
    /// Instrument short name (`instData.@nm`).
    pub stock: String,
    pub samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Chart-data response envelope.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "@status")]
    status: serde_json::Value,
    #[serde(default)]
    data: Vec<HistoryData>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(rename = "instData")]
    inst_data: InstData,
    #[serde(rename = "chartData")]
    chart_data: ChartData,
}

#[derive(Debug, Deserialize)]
struct InstData {
    #[serde(rename = "@nm")]
    name: String,
    #[serde(rename = "@fnm")]
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    cp: Vec<(f64, f64)>,
}

/// Parse the chart-data JSON body for `instrument_id` into a series.
///
/// Fails with `BadStatus` when the envelope reports anything but success.
pub fn parse_price_history(instrument_id: &str, body: &str) -> Result<PriceSeries, DataError> {
    let resp: HistoryResponse = serde_json::from_str(body).map_err(|e| {
        DataError::MalformedResponse(format!(
            "failed to parse history response for {instrument_id}: {e}"
        ))
    })?;

    if status_code(&resp.status) != Some(STATUS_OK) {
        return Err(DataError::BadStatus {
            status: status_text(&resp.status),
            instrument: instrument_id.to_string(),
        });
    }

    let data = resp
        .data
        .into_iter()
        .next()
        .ok_or_else(|| DataError::MalformedResponse("data array is empty".into()))?;

    let samples = data
        .chart_data
        .cp
        .into_iter()
        .map(|(millis, value)| sample_from_millis(millis, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceSeries {
        company: data.inst_data.full_name,
        stock: data.inst_data.name,
        samples,
    })
}

fn sample_from_millis(millis: f64, value: f64) -> Result<PriceSample, DataError> {
    let timestamp = (millis / 1000.0).floor() as i64;
    let datetime = DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| DataError::MalformedResponse(format!("invalid timestamp: {millis}")))?;
    Ok(PriceSample {
        timestamp,
        value,
        datetime,
    })
}

/// The feed sends the status as a number or a numeric string.
fn status_code(status: &serde_json::Value) -> Option<i64> {
    match status {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn status_text(status: &serde_json::Value) -> String {
    match status {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const OK_BODY: &str = r#"{
        "@status": "1",
        "data": [{
            "instData": {"@nm": "NOKIA", "@fnm": "Nokia Oyj", "@id": "HEX24311"},
            "chartData": {"cp": [[1577923200000, 3.56], [1578009600999, 3.61]]}
        }]
    }"#;

    #[test]
    fn parses_company_stock_and_samples() {
        let series = parse_price_history("HEX24311", OK_BODY).unwrap();

        assert_eq!(series.company, "Nokia Oyj");
        assert_eq!(series.stock, "NOKIA");
        assert_eq!(series.len(), 2);
        assert_eq!(series.samples[0].timestamp, 1_577_923_200);
        assert_eq!(series.samples[0].value, 3.56);
        assert_eq!(
            series.samples[0].datetime,
            NaiveDate::from_ymd_opt(2020, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        // Sub-second remainder is floored away.
        assert_eq!(series.samples[1].timestamp, 1_578_009_600);
    }

    #[test]
    fn numeric_status_is_accepted() {
        let body = OK_BODY.replace(r#""@status": "1""#, r#""@status": 1"#);
        assert!(parse_price_history("HEX24311", &body).is_ok());
    }

    #[test]
    fn failure_status_is_bad_status() {
        let body = r#"{"@status": "0", "data": []}"#;
        match parse_price_history("HEX0", body) {
            Err(DataError::BadStatus { status, instrument }) => {
                assert_eq!(status, "0");
                assert_eq!(instrument, "HEX0");
            }
            other => panic!("expected BadStatus, got {other:?}"),
        }
    }

    #[test]
    fn empty_data_array_is_malformed() {
        let body = r#"{"@status": "1", "data": []}"#;
        assert!(matches!(
            parse_price_history("HEX1", body),
            Err(DataError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_price_history("HEX1", "<html/>"),
            Err(DataError::MalformedResponse(_))
        ));
    }
}
