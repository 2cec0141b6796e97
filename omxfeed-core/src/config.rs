//! Feed configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! cache_dir = "cache"
//! read_cache = true
//! write_cache = true
//! range_match = "within_request"
//! base_url = "http://www.nasdaqomxnordic.com/webproxy/DataFeedProxy.aspx"
//! timeout_secs = 30
//! instrument_prefix = "HEX"
//! ```

use crate::data::cache_key::RangeMatch;
use crate::data::nasdaq::DEFAULT_BASE_URL;
use crate::data::provider::DataError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration threaded through every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Directory holding cache files. Created on first use.
    pub cache_dir: PathBuf,
    /// Serve requests from the cache when a matching entry exists.
    pub read_cache: bool,
    /// Store fetched results in the cache.
    pub write_cache: bool,
    /// Which cached date ranges may answer a price-series request.
    pub range_match: RangeMatch,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Price history is only available for instrument ids with this prefix.
    pub instrument_prefix: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            read_cache: true,
            write_cache: true,
            range_match: RangeMatch::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            instrument_prefix: "HEX".to_string(),
        }
    }
}

impl FeedConfig {
    /// Default configuration with a different cache directory.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::Config(format!("parse config TOML: {e}")))
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self).map_err(|e| DataError::Config(format!("serialize config: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether any cache access will happen.
    pub fn uses_cache(&self) -> bool {
        self.read_cache || self.write_cache
    }
}
