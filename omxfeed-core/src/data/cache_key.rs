//! Cache keys and their file-name encoding.
//!
//! Price series: `{instrument}_{start}_{end}.data`
//! Instrument listings: `instruments_{day}_{suffix}[_{suffix}...].data`
//!
//! The file name is the whole key; nothing inside a cache file is consulted
//! to decide whether it matches a request.

use super::dates::format_day;
use super::markets::Market;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Extension shared by every cache file.
pub const CACHE_EXTENSION: &str = "data";

const LISTING_PREFIX: &str = "instruments";

/// A file name that has the shape of a cache key but cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed cache file name '{name}': {reason}")]
pub struct KeyError {
    pub name: String,
    pub reason: String,
}

/// How a cached date range has to relate to a requested one to be reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMatch {
    /// Cached range lies inside the requested one:
    /// `cached_start >= start && cached_end <= end`.
    #[default]
    WithinRequest,
    /// Cached range spans the requested one:
    /// `cached_start <= start && cached_end >= end`.
    CoversRequest,
}

impl RangeMatch {
    pub fn accepts(
        self,
        cached_start: NaiveDate,
        cached_end: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> bool {
        match self {
            RangeMatch::WithinRequest => cached_start >= start && cached_end <= end,
            RangeMatch::CoversRequest => cached_start <= start && cached_end >= end,
        }
    }
}

/// Key of a cached price series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub instrument_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeriesKey {
    pub fn new(instrument_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            start,
            end,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{CACHE_EXTENSION}",
            self.instrument_id,
            format_day(self.start),
            format_day(self.end)
        )
    }

    /// Decode a file name.
    ///
    /// `Ok(None)` means the name is not a price-series key at all (wrong
    /// number of components). `Err` means it has the right shape but an
    /// embedded date is unparseable.
    pub fn from_file_name(name: &str) -> Result<Option<Self>, KeyError> {
        let stem = strip_extension(name);
        let parts: Vec<&str> = stem.split('_').collect();
        let [instrument_id, start, end] = parts.as_slice() else {
            return Ok(None);
        };

        let start = parse_key_day(name, start)?;
        let end = parse_key_day(name, end)?;
        Ok(Some(Self::new(*instrument_id, start, end)))
    }
}

/// Key of a cached instrument listing: one per market set per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub day: NaiveDate,
    /// Market code suffixes, sorted.
    pub suffixes: Vec<String>,
}

impl ListingKey {
    pub fn new(markets: &[Market], day: NaiveDate) -> Self {
        let mut suffixes: Vec<String> = markets.iter().map(|m| m.suffix().to_string()).collect();
        suffixes.sort();
        Self { day, suffixes }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{LISTING_PREFIX}_{}_{}.{CACHE_EXTENSION}",
            format_day(self.day),
            self.suffixes.join("_")
        )
    }

    /// Decode a file name; `Ok(None)` when it is not a listing key.
    pub fn from_file_name(name: &str) -> Result<Option<Self>, KeyError> {
        let stem = strip_extension(name);
        let mut parts = stem.split('_');
        if parts.next() != Some(LISTING_PREFIX) {
            return Ok(None);
        }
        let Some(day) = parts.next() else {
            return Ok(None);
        };
        let suffixes: Vec<String> = parts.map(str::to_string).collect();
        if suffixes.is_empty() {
            return Ok(None);
        }

        let day = parse_key_day(name, day)?;
        Ok(Some(Self { day, suffixes }))
    }
}

/// Find a cached series for `instrument_id` whose range satisfies `rule`.
///
/// Returns the first acceptable name in listing order. Names with
/// unparseable dates are logged and skipped.
pub fn find_series_entry<'a, I>(
    file_names: I,
    instrument_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    rule: RangeMatch,
) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    for name in file_names {
        let key = match SeriesKey::from_file_name(name) {
            Ok(Some(key)) => key,
            Ok(None) => continue,
            Err(e) => {
                // The instrument id is still readable; only complain about our own files.
                if strip_extension(name).split('_').next() == Some(instrument_id) {
                    warn!("failed to parse dates from cache file {name}: {}", e.reason);
                }
                continue;
            }
        };

        if key.instrument_id != instrument_id {
            continue;
        }

        if rule.accepts(key.start, key.end, start, end) {
            return Some(name.to_string());
        }
    }

    None
}

/// Exact-name lookup of a listing key in a directory listing.
pub fn find_listing_entry<'a, I>(file_names: I, key: &ListingKey) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = key.file_name();
    file_names
        .into_iter()
        .find(|name| *name == wanted)
        .map(str::to_string)
}

fn strip_extension(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn parse_key_day(name: &str, part: &str) -> Result<NaiveDate, KeyError> {
    NaiveDate::parse_from_str(part, "%Y-%m-%d").map_err(|e| KeyError {
        name: name.to_string(),
        reason: format!("'{part}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn series_key_file_name() {
        let key = SeriesKey::new("HEX24311", day("2020-01-01"), day("2020-12-31"));
        assert_eq!(key.file_name(), "HEX24311_2020-01-01_2020-12-31.data");
        assert_eq!(
            SeriesKey::from_file_name(&key.file_name()).unwrap(),
            Some(key)
        );
    }

    #[test]
    fn series_key_ignores_other_shapes() {
        assert_eq!(SeriesKey::from_file_name("HEX1_2020-01-01.data").unwrap(), None);
        assert_eq!(
            SeriesKey::from_file_name("instruments_2024-01-01_4310_4320.data").unwrap(),
            None
        );
        assert!(SeriesKey::from_file_name("HEX1_yesterday_2020-01-01.data").is_err());
    }

    #[test]
    fn within_request_accepts_narrower_cached_range() {
        let files = ["HEX1_2020-03-01_2020-06-30.data"];
        let hit = find_series_entry(
            files,
            "HEX1",
            day("2020-01-01"),
            day("2020-12-31"),
            RangeMatch::WithinRequest,
        );
        assert_eq!(hit.as_deref(), Some("HEX1_2020-03-01_2020-06-30.data"));
    }

    #[test]
    fn within_request_rejects_wider_cached_range() {
        let files = ["HEX1_2019-01-01_2021-12-31.data"];
        let hit = find_series_entry(
            files,
            "HEX1",
            day("2020-01-01"),
            day("2020-12-31"),
            RangeMatch::WithinRequest,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn covers_request_is_the_mirror_image() {
        let files = [
            "HEX1_2020-03-01_2020-06-30.data",
            "HEX1_2019-01-01_2021-12-31.data",
        ];
        let hit = find_series_entry(
            files,
            "HEX1",
            day("2020-01-01"),
            day("2020-12-31"),
            RangeMatch::CoversRequest,
        );
        assert_eq!(hit.as_deref(), Some("HEX1_2019-01-01_2021-12-31.data"));
    }

    #[test]
    fn lookup_skips_foreign_and_malformed_names() {
        let files = [
            "notes.txt",
            "HEX1_garbage_2020-02-01.data",
            "HEX2_2020-01-01_2020-12-31.data",
            "HEX1_2020-01-01_2020-12-31.data",
        ];
        let hit = find_series_entry(
            files,
            "HEX1",
            day("2020-01-01"),
            day("2020-12-31"),
            RangeMatch::WithinRequest,
        );
        assert_eq!(hit.as_deref(), Some("HEX1_2020-01-01_2020-12-31.data"));
    }

    #[test]
    fn listing_key_sorts_suffixes() {
        let key = ListingKey::new(
            &[Market::HelsinkiMid, Market::CopenhagenLarge, Market::HelsinkiLarge],
            day("2024-05-02"),
        );
        assert_eq!(key.file_name(), "instruments_2024-05-02_4310_4320_6510.data");
        assert_eq!(
            ListingKey::from_file_name(&key.file_name()).unwrap(),
            Some(key)
        );
    }

    #[test]
    fn listing_lookup_is_exact_and_day_scoped() {
        let markets = [Market::HelsinkiLarge];
        let files = ["instruments_2024-05-01_4310.data"];

        let today = ListingKey::new(&markets, day("2024-05-02"));
        assert_eq!(find_listing_entry(files, &today), None);

        let yesterday = ListingKey::new(&markets, day("2024-05-01"));
        assert_eq!(
            find_listing_entry(files, &yesterday).as_deref(),
            Some("instruments_2024-05-01_4310.data")
        );

        let other_set = ListingKey::new(&[Market::HelsinkiLarge, Market::HelsinkiMid], day("2024-05-01"));
        assert_eq!(find_listing_entry(files, &other_set), None);
    }
}
