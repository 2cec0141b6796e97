//! Data access: API client, response parsing and the file cache.

pub mod cache_key;
pub mod dates;
pub mod feed;
pub mod history;
pub mod instruments;
pub mod markets;
pub mod nasdaq;
pub mod provider;
pub mod store;

pub use cache_key::{KeyError, ListingKey, RangeMatch, SeriesKey};
pub use dates::{normalize_date, parse_date, DateInput};
pub use feed::{Feed, Fetched};
pub use history::{PriceSample, PriceSeries};
pub use instruments::{filter_instruments, filter_raw_instruments, MarketInstrument, RawInstrument};
pub use markets::Market;
pub use nasdaq::NasdaqClient;
pub use provider::{DataError, DataSource, MarketApi};
pub use store::{CacheEntry, CacheEntryKind, CacheStore};
