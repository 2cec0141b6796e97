//! Instrument listing: XML parsing, typed records, name filtering.

use super::provider::DataError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One instrument as it appears in the listing response, before any
/// numeric coercion. This is also what the listing cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInstrument {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub market: String,
    pub bid_price: String,
    pub ask_price: String,
    pub last_price: String,
    pub total_volume: String,
}

/// An instrument with its quote snapshot coerced to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInstrument {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub market: String,
    pub bid_price: f64,
    pub ask_price: f64,
    pub last_price: f64,
    pub total_volume: f64,
}

impl MarketInstrument {
    /// Coerce a raw record.
    ///
    /// Blank numeric attributes (no quote yet) become `NaN`; anything else
    /// that is not a number is rejected.
    pub fn from_raw(raw: &RawInstrument) -> Result<Self, DataError> {
        Ok(Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            full_name: raw.full_name.clone(),
            market: raw.market.clone(),
            bid_price: parse_number("bid_price", &raw.bid_price)?,
            ask_price: parse_number("ask_price", &raw.ask_price)?,
            last_price: parse_number("last_price", &raw.last_price)?,
            total_volume: parse_number("total_volume", &raw.total_volume)?,
        })
    }
}

impl TryFrom<&RawInstrument> for MarketInstrument {
    type Error = DataError;

    fn try_from(raw: &RawInstrument) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, DataError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| DataError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Parse the market listing XML into flat instrument records.
///
/// Every `<market nm="...">` contributes the element children of its
/// `<instruments>` wrapper (or its own element children if there is no
/// wrapper). Markets without instruments are skipped with a warning.
pub fn parse_market_listing(xml: &str) -> Result<Vec<RawInstrument>, DataError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| DataError::MalformedResponse(format!("listing is not valid XML: {e}")))?;

    let markets: Vec<roxmltree::Node> = doc
        .descendants()
        .filter(|n| is_element(n, "market"))
        .collect();
    if markets.is_empty() {
        return Err(DataError::NoMarketsFound);
    }

    let mut instruments = Vec::new();

    for market in markets {
        let market_name = required_attr(&market, "nm")?;
        info!("processing market {market_name}");

        let container = market
            .children()
            .find(|n| is_element(n, "instruments"))
            .unwrap_or(market);
        let elements: Vec<roxmltree::Node> =
            container.children().filter(|n| n.is_element()).collect();

        if elements.is_empty() {
            warn!("market {market_name} had no instruments");
            continue;
        }

        for inst in elements {
            let record = RawInstrument {
                id: required_attr(&inst, "id")?.to_string(),
                name: required_attr(&inst, "nm")?.to_string(),
                full_name: required_attr(&inst, "fnm")?.to_string(),
                market: market_name.to_string(),
                bid_price: required_attr(&inst, "bp")?.to_string(),
                ask_price: required_attr(&inst, "ap")?.to_string(),
                last_price: required_attr(&inst, "lp")?.to_string(),
                total_volume: required_attr(&inst, "tv")?.to_string(),
            };
            debug!("found instrument {} id {}", record.name, record.id);
            instruments.push(record);
        }
    }

    Ok(instruments)
}

fn is_element(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
}

fn required_attr<'a>(node: &roxmltree::Node<'a, '_>, attr: &str) -> Result<&'a str, DataError> {
    node.attribute(attr)
        .ok_or_else(|| DataError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attr.to_string(),
        })
}

/// Instruments whose short or full name contains `needle`, case-insensitively.
pub fn filter_instruments<'a>(
    instruments: &'a [MarketInstrument],
    needle: &str,
) -> Vec<&'a MarketInstrument> {
    let needle = needle.to_lowercase();
    instruments
        .iter()
        .filter(|i| name_matches(&i.name, &i.full_name, &needle))
        .collect()
}

/// Same as [`filter_instruments`] over raw records.
pub fn filter_raw_instruments<'a>(
    instruments: &'a [RawInstrument],
    needle: &str,
) -> Vec<&'a RawInstrument> {
    let needle = needle.to_lowercase();
    instruments
        .iter()
        .filter(|i| name_matches(&i.name, &i.full_name, &needle))
        .collect()
}

fn name_matches(name: &str, full_name: &str, needle: &str) -> bool {
    name.trim().to_lowercase().contains(needle) || full_name.trim().to_lowercase().contains(needle)
}
