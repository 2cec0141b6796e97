//! omxfeed CLI: instrument listings, price history and cache inspection.
//!
//! Commands:
//! - `instruments`: list instruments of one or more markets (cached per day)
//! - `prices`: price history of one instrument over a date range
//! - `markets`: the selectable markets and their venue codes
//! - `cache status`: what the cache directory currently holds

use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use omxfeed_core::data::dates::{format_day, parse_date};
use omxfeed_core::data::feed::today;
use omxfeed_core::data::store::CacheEntryKind;
use omxfeed_core::data::{filter_raw_instruments, NasdaqClient};
use omxfeed_core::{filter_instruments, DataSource, Feed, FeedConfig, Market, MarketInstrument};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "omxfeed",
    about = "omxfeed: Nasdaq Nordic listings and price history with a local cache"
)]
struct Cli {
    #[command(flatten)]
    feed: FeedArgs,

    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FeedArgs {
    /// TOML config file. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory. Defaults to ./cache.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Never answer from the cache.
    #[arg(long, global = true, default_value_t = false)]
    no_read_cache: bool,

    /// Never store results in the cache.
    #[arg(long, global = true, default_value_t = false)]
    no_write_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List instruments of one or more markets.
    Instruments {
        /// Markets to query (e.g., helsinki-large stockholm-mid).
        #[arg(required = true)]
        markets: Vec<String>,

        /// Only instruments whose short or full name contains this text.
        #[arg(long)]
        filter: Option<String>,

        /// Print the records as received, without numeric coercion.
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Write the result to a CSV file instead of stdout.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Price history of one instrument.
    Prices {
        /// Instrument id as returned by `instruments` (e.g., HEX24311).
        instrument: String,

        /// Start date. Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Include company and stock name in the output.
        #[arg(long, default_value_t = false)]
        full: bool,

        /// Write the samples to a CSV file instead of stdout.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show the selectable markets.
    Markets,
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached price series and instrument lists.
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli.feed)?;

    match cli.command {
        Commands::Instruments {
            markets,
            filter,
            raw,
            csv,
        } => run_instruments(config, &markets, filter.as_deref(), raw, csv.as_deref()),
        Commands::Prices {
            instrument,
            start,
            end,
            full,
            csv,
        } => run_prices(config, &instrument, start, end, full, csv.as_deref()),
        Commands::Markets => {
            run_markets();
            Ok(())
        }
        Commands::Cache { action } => match action {
            CacheAction::Status => run_cache_status(config),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &FeedArgs) -> Result<FeedConfig> {
    let mut config = match &args.config {
        Some(path) => FeedConfig::from_file(path)?,
        None => FeedConfig::default(),
    };

    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    if args.no_read_cache {
        config.read_cache = false;
    }
    if args.no_write_cache {
        config.write_cache = false;
    }

    Ok(config)
}

fn live_feed(config: FeedConfig) -> Result<Feed<NasdaqClient>> {
    Feed::from_config(config).context("failed to set up data feed client")
}

fn run_instruments(
    config: FeedConfig,
    market_names: &[String],
    filter: Option<&str>,
    raw: bool,
    csv_path: Option<&Path>,
) -> Result<()> {
    let markets = market_names
        .iter()
        .map(|name| name.parse::<Market>())
        .collect::<Result<Vec<_>, _>>()?;

    let feed = live_feed(config)?;
    let fetched = feed.fetch_listing_on(&markets, today())?;
    report_source(fetched.source);

    if raw {
        let records = match filter {
            Some(needle) => filter_raw_instruments(&fetched.value, needle),
            None => fetched.value.iter().collect(),
        };
        return match csv_path {
            Some(path) => write_csv(path, &records),
            None => {
                for r in &records {
                    println!("{}", serde_json::to_string(r)?);
                }
                Ok(())
            }
        };
    }

    let instruments = fetched
        .value
        .iter()
        .map(MarketInstrument::from_raw)
        .collect::<Result<Vec<_>, _>>()?;
    let selected = match filter {
        Some(needle) => filter_instruments(&instruments, needle),
        None => instruments.iter().collect(),
    };

    match csv_path {
        Some(path) => write_csv(path, &selected),
        None => {
            print_instruments(&selected);
            Ok(())
        }
    }
}

fn run_prices(
    config: FeedConfig,
    instrument: &str,
    start: Option<String>,
    end: Option<String>,
    full: bool,
    csv_path: Option<&Path>,
) -> Result<()> {
    let end_date = match end {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let start_date = match start {
        Some(s) => parse_date(s)?,
        None => end_date - Duration::days(365),
    };
    if start_date > end_date {
        bail!(
            "start date {} is after end date {}",
            format_day(start_date),
            format_day(end_date)
        );
    }

    let feed = live_feed(config)?;
    let fetched = feed.fetch_price_series(instrument, start_date, end_date)?;
    report_source(fetched.source);
    let series = fetched.value;

    if let Some(path) = csv_path {
        return write_csv(path, &series.samples);
    }

    if full {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "company": series.company,
                "stock": series.stock,
                "samples": series.len(),
            }))?
        );
    }

    println!("{:<20} {:>12} {:>12}", "DateTime", "Timestamp", "Value");
    println!("{}", "-".repeat(46));
    for s in &series.samples {
        println!(
            "{:<20} {:>12} {:>12.4}",
            s.datetime.format("%Y-%m-%d %H:%M:%S"),
            s.timestamp,
            s.value
        );
    }

    Ok(())
}

fn run_markets() {
    println!("{:<18} {}", "Market", "Code");
    println!("{}", "-".repeat(34));
    for market in Market::ALL {
        println!("{:<18} {}", market.name(), market.code());
    }
}

fn run_cache_status(config: FeedConfig) -> Result<()> {
    let feed = live_feed(config)?;
    let store = feed.store();
    let cache_dir = store.dir();
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let entries = store.entries()?;
    if entries.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let total_size: u64 = entries.iter().map(|e| e.size).sum();
    println!("Cache: {}", cache_dir.display());
    println!("Files: {}", entries.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!("{:<10} {:<14} {:<25} {:>10}", "Kind", "Key", "Range / Day", "Size");
    println!("{}", "-".repeat(62));

    for entry in &entries {
        let (kind, key, range) = match &entry.kind {
            CacheEntryKind::Series(k) => (
                "series",
                k.instrument_id.clone(),
                format!("{} to {}", format_day(k.start), format_day(k.end)),
            ),
            CacheEntryKind::Listing(k) => ("listing", k.suffixes.join(","), format_day(k.day)),
            CacheEntryKind::Unrecognized => ("other", entry.name.clone(), String::new()),
        };
        println!(
            "{:<10} {:<14} {:<25} {:>10}",
            kind,
            key,
            range,
            format_size(entry.size)
        );
    }

    Ok(())
}

fn report_source(source: DataSource) {
    match source {
        DataSource::Cache => info!("served from cache"),
        DataSource::Network => info!("fetched from data feed"),
    }
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn print_instruments(instruments: &[&MarketInstrument]) {
    println!(
        "{:<10} {:<12} {:<30} {:<20} {:>10} {:>10} {:>10} {:>14}",
        "Id", "Name", "Full name", "Market", "Bid", "Ask", "Last", "Volume"
    );
    println!("{}", "-".repeat(124));
    for i in instruments {
        println!(
            "{:<10} {:<12} {:<30} {:<20} {:>10.3} {:>10.3} {:>10.3} {:>14.0}",
            i.id, i.name, i.full_name, i.market, i.bid_price, i.ask_price, i.last_price, i.total_volume
        );
    }
    println!("\n{} instrument(s)", instruments.len());
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::parse_from([
            "omxfeed",
            "--cache-dir",
            "/tmp/omx",
            "--no-write-cache",
            "prices",
            "HEX24311",
        ]);
        let config = build_config(&cli.feed).unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/omx"));
        assert!(config.read_cache);
        assert!(!config.write_cache);
    }

    #[test]
    fn instruments_requires_a_market() {
        assert!(Cli::try_parse_from(["omxfeed", "instruments"]).is_err());
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
