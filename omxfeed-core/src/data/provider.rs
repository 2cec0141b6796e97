//! Market data API trait and structured error types.
//!
//! The MarketApi trait abstracts over the transport to the data feed so the
//! fetch/cache orchestration can run against a recorded fixture in tests.

use super::markets::Market;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between a caller's arguments and a parsed
/// feed response, including the cache directory in between.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid instrument id '{id}': expected prefix '{prefix}'")]
    InvalidInstrument { id: String, prefix: String },

    #[error("invalid date string '{0}'")]
    InvalidDate(String),

    #[error("no markets found in listing response")]
    NoMarketsFound,

    #[error("<{element}> element is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("field '{field}' is not numeric: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid status {status} for instrument {instrument}")]
    BadStatus { status: String, instrument: String },

    #[error("response format changed: {0}")]
    MalformedResponse(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("HTTP {status} from data feed")]
    HttpStatus { status: u16 },

    #[error("corrupt cache file {}: {reason}", .path.display())]
    CorruptCache { path: PathBuf, reason: String },

    #[error("provided path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Transport to the data feed.
///
/// Implementations return the raw response body; parsing lives with the
/// record types so every transport shares it.
pub trait MarketApi {
    /// Human-readable name of this transport.
    fn name(&self) -> &str;

    /// Fetch the instrument listing XML for one or more markets.
    fn market_listing(&self, markets: &[Market]) -> Result<String, DataError>;

    /// Fetch the price-history JSON for an instrument over `from..=to`
    /// (both ISO day strings).
    fn price_history(&self, instrument_id: &str, from: &str, to: &str)
        -> Result<String, DataError>;
}

impl<T: MarketApi + ?Sized> MarketApi for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn market_listing(&self, markets: &[Market]) -> Result<String, DataError> {
        (**self).market_listing(markets)
    }

    fn price_history(
        &self,
        instrument_id: &str,
        from: &str,
        to: &str,
    ) -> Result<String, DataError> {
        (**self).price_history(instrument_id, from, to)
    }
}

/// Where a fetch result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Network,
    Cache,
}
