//! Nasdaq Nordic data-feed proxy client.
//!
//! Both operations are plain GETs against one base URL, selected by query
//! parameters. The listing comes back as XML, the price history as JSON.
//! There is no retry: a failed request is reported to the caller as-is.

use super::markets::Market;
use super::provider::{DataError, MarketApi};
use std::time::Duration;
use tracing::debug;

/// Default endpoint of the data-feed proxy.
pub const DEFAULT_BASE_URL: &str = "http://www.nasdaqomxnordic.com/webproxy/DataFeedProxy.aspx";

const HISTORY_APP: &str = "/osakkeet/historiallisetkurssitiedot-HistoryChar";

/// Blocking HTTP transport to the data feed.
pub struct NasdaqClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NasdaqClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Query parameters for the instrument listing.
    fn listing_params(markets: &[Market]) -> Vec<(&'static str, String)> {
        let codes: Vec<&str> = markets.iter().map(|m| m.code()).collect();
        vec![
            ("Exchange", "NMF".into()),
            ("SubSystem", "Prices".into()),
            ("Action", "GetMarket".into()),
            ("app", "/osakkeet".into()),
            ("Market", codes.join(",")),
        ]
    }

    /// Query parameters for the chart-data history.
    fn history_params(instrument_id: &str, from: &str, to: &str) -> Vec<(&'static str, String)> {
        vec![
            ("SubSystem", "History".into()),
            ("Action", "GetChartData".into()),
            ("FromDate", from.into()),
            ("ToDate", to.into()),
            ("json", "True".into()),
            ("showAdjusted", "True".into()),
            ("app", HISTORY_APP.into()),
            ("DefaultDecimals", "False".into()),
            ("Instrument", instrument_id.into()),
        ]
    }

    fn get(&self, params: &[(&'static str, String)]) -> Result<String, DataError> {
        debug!("GET {} {:?}", self.base_url, params);

        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
            });
        }

        resp.text()
            .map_err(|e| DataError::Network(format!("failed to read response body: {e}")))
    }
}

impl MarketApi for NasdaqClient {
    fn name(&self) -> &str {
        "nasdaq_nordic"
    }

    fn market_listing(&self, markets: &[Market]) -> Result<String, DataError> {
        if markets.is_empty() {
            return Err(DataError::InvalidArgument("no markets given".into()));
        }
        self.get(&Self::listing_params(markets))
    }

    fn price_history(
        &self,
        instrument_id: &str,
        from: &str,
        to: &str,
    ) -> Result<String, DataError> {
        self.get(&Self::history_params(instrument_id, from, to))
    }
}
