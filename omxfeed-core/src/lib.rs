//! omxfeed core: Nasdaq Nordic instrument listings and price history.
//!
//! This crate contains:
//! - Date normalization for loosely formatted inputs
//! - Cache keys encoded in file names, and the versioned file store
//! - Listing XML and history JSON parsing into typed records
//! - A blocking client for the data-feed proxy behind the `MarketApi` trait
//! - `Feed`, which ties lookup, fetch and write-through together

pub mod config;
pub mod data;

pub use config::FeedConfig;
pub use data::{
    filter_instruments, DataError, DataSource, Feed, Market, MarketApi, MarketInstrument,
    PriceSample, PriceSeries, RawInstrument,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public records can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<MarketInstrument>();
        require_sync::<MarketInstrument>();
        require_send::<RawInstrument>();
        require_sync::<RawInstrument>();
        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<FeedConfig>();
        require_sync::<FeedConfig>();
        require_send::<DataError>();
        require_sync::<DataError>();
    }
}
