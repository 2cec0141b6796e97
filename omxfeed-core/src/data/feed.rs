//! Fetch orchestration: date normalization → cache lookup → API → cache write.
//!
//! Two independent entry points share nothing but the cache directory:
//! - price series for one instrument over a date range
//! - instrument listing for a set of markets, cached per calendar day

use super::cache_key::{find_listing_entry, find_series_entry, ListingKey, SeriesKey};
use super::dates::{format_day, parse_date, DateInput};
use super::history::{parse_price_history, PriceSample, PriceSeries};
use super::instruments::{parse_market_listing, MarketInstrument, RawInstrument};
use super::markets::Market;
use super::nasdaq::NasdaqClient;
use super::provider::{DataError, DataSource, MarketApi};
use super::store::CacheStore;
use crate::config::FeedConfig;
use chrono::NaiveDate;
use tracing::{debug, info};

/// A fetch result together with where it came from.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub source: DataSource,
}

/// Cached access to the data feed.
pub struct Feed<A> {
    api: A,
    config: FeedConfig,
    store: CacheStore,
}

impl Feed<NasdaqClient> {
    /// Feed backed by the live HTTP client configured by `config`.
    pub fn from_config(config: FeedConfig) -> Result<Self, DataError> {
        let api = NasdaqClient::new(config.base_url.clone(), config.timeout())?;
        Ok(Self::new(api, config))
    }
}

impl<A: MarketApi> Feed<A> {
    pub fn new(api: A, config: FeedConfig) -> Self {
        let store = CacheStore::new(config.cache_dir.clone());
        Self { api, config, store }
    }

    /// The cache directory this feed reads and writes.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    // ── Price series ────────────────────────────────────────────────

    /// Price history for `instrument_id` over `start..=end`, with provenance.
    pub fn fetch_price_series(
        &self,
        instrument_id: &str,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
    ) -> Result<Fetched<PriceSeries>, DataError> {
        if !instrument_id.starts_with(&self.config.instrument_prefix) {
            return Err(DataError::InvalidInstrument {
                id: instrument_id.to_string(),
                prefix: self.config.instrument_prefix.clone(),
            });
        }

        let start = parse_date(start)?;
        let end = parse_date(end)?;

        if self.config.uses_cache() {
            self.store.ensure_dir()?;
        }

        if self.config.read_cache {
            if let Some(series) = self.cached_series(instrument_id, start, end)? {
                return Ok(Fetched {
                    value: series,
                    source: DataSource::Cache,
                });
            }
        }

        let (from, to) = (format_day(start), format_day(end));
        debug!("fetching price history for {instrument_id} {from}..{to} via {}", self.api.name());
        let body = self.api.price_history(instrument_id, &from, &to)?;
        let series = parse_price_history(instrument_id, &body)?;

        if self.config.write_cache {
            let name = SeriesKey::new(instrument_id, start, end).file_name();
            info!("storing {instrument_id} to cache as {name}");
            self.store.write(&name, &series)?;
        }

        Ok(Fetched {
            value: series,
            source: DataSource::Network,
        })
    }

    /// Company, stock name and samples for `instrument_id` over `start..=end`.
    pub fn price_series(
        &self,
        instrument_id: &str,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
    ) -> Result<PriceSeries, DataError> {
        self.fetch_price_series(instrument_id, start, end)
            .map(|f| f.value)
    }

    /// Only the samples of [`Feed::price_series`].
    pub fn price_samples(
        &self,
        instrument_id: &str,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
    ) -> Result<Vec<PriceSample>, DataError> {
        self.price_series(instrument_id, start, end)
            .map(|s| s.samples)
    }

    fn cached_series(
        &self,
        instrument_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<PriceSeries>, DataError> {
        let names = self.store.list()?;
        let hit = find_series_entry(
            names.iter().map(String::as_str),
            instrument_id,
            start,
            end,
            self.config.range_match,
        );

        let Some(name) = hit else {
            return Ok(None);
        };
        info!("loading {instrument_id} from cache file {name}");
        self.store.read(&name)
    }

    // ── Instrument listing ──────────────────────────────────────────

    /// Raw instrument records for `markets` as listed on `day`, with provenance.
    pub fn fetch_listing_on(
        &self,
        markets: &[Market],
        day: NaiveDate,
    ) -> Result<Fetched<Vec<RawInstrument>>, DataError> {
        if markets.is_empty() {
            return Err(DataError::InvalidArgument("no markets given".into()));
        }

        if self.config.uses_cache() {
            self.store.ensure_dir()?;
        }

        let key = ListingKey::new(markets, day);

        if self.config.read_cache {
            let names = self.store.list()?;
            if let Some(name) = find_listing_entry(names.iter().map(String::as_str), &key) {
                info!("loading instrument list from cache file {name}");
                if let Some(records) = self.store.read(&name)? {
                    return Ok(Fetched {
                        value: records,
                        source: DataSource::Cache,
                    });
                }
            }
        }

        debug!("fetching instrument listing via {}", self.api.name());
        let body = self.api.market_listing(markets)?;
        debug!("parsing instruments");
        let records = parse_market_listing(&body)?;

        if self.config.write_cache {
            let name = key.file_name();
            info!("storing instruments for {} as {name}", format_day(day));
            self.store.write(&name, &records)?;
        }

        Ok(Fetched {
            value: records,
            source: DataSource::Network,
        })
    }

    /// Raw instrument records for `markets` as listed on `day`.
    pub fn market_instruments_raw_on(
        &self,
        markets: &[Market],
        day: NaiveDate,
    ) -> Result<Vec<RawInstrument>, DataError> {
        self.fetch_listing_on(markets, day).map(|f| f.value)
    }

    /// Typed instruments for `markets` as listed on `day`.
    pub fn market_instruments_on(
        &self,
        markets: &[Market],
        day: NaiveDate,
    ) -> Result<Vec<MarketInstrument>, DataError> {
        self.market_instruments_raw_on(markets, day)?
            .iter()
            .map(MarketInstrument::from_raw)
            .collect()
    }

    /// Raw instrument records for `markets`, cached for today.
    pub fn market_instruments_raw(&self, markets: &[Market]) -> Result<Vec<RawInstrument>, DataError> {
        self.market_instruments_raw_on(markets, today())
    }

    /// Typed instruments for `markets`, cached for today.
    pub fn market_instruments(&self, markets: &[Market]) -> Result<Vec<MarketInstrument>, DataError> {
        self.market_instruments_on(markets, today())
    }
}

/// Local calendar day used to key listing caches.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
