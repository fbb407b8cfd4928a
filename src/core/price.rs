//! Market prices supplied by an external price source.
//!
//! `PriceCache` holds the latest price per symbol with an explicit time to
//! live. Callers pass `now` in, so lookups are deterministic and the cache
//! is owned by whoever needs it rather than living in module state.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: Decimal },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A price observation for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPrice {
    pub symbol: String,
    /// Price per unit in EUR
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct PriceCache {
    ttl: Duration,
    entries: HashMap<String, AssetPrice>,
}

impl Default for PriceCache {
    fn default() -> Self {
        PriceCache::new(Duration::seconds(60))
    }
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        PriceCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Expiry that overflows the calendar never expires.
    fn is_fresh(&self, price: &AssetPrice, now: DateTime<Utc>) -> bool {
        price
            .fetched_at
            .checked_add_signed(self.ttl)
            .is_none_or(|expires| now < expires)
    }

    pub fn insert(&mut self, price: AssetPrice) {
        let key = price.symbol.to_uppercase();
        log::debug!("Price cache SET: {} = {} ({})", key, price.price, price.source);
        self.entries.insert(key, price);
    }

    /// Fresh price for `symbol` at `now`, or `None` when missing or expired.
    pub fn get(&self, symbol: &str, now: DateTime<Utc>) -> Option<&AssetPrice> {
        self.entries
            .get(&symbol.to_uppercase())
            .filter(|p| self.is_fresh(p, now))
    }

    /// Symbol to price map of every fresh entry, as consumed by the holdings valuator.
    pub fn current_prices(&self, now: DateTime<Utc>) -> HashMap<String, Decimal> {
        self.entries
            .iter()
            .filter(|(_, p)| self.is_fresh(p, now))
            .map(|(symbol, p)| (symbol.clone(), p.price))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    symbol: String,
    price: Decimal,
}

fn checked(record: PriceRecord) -> Result<PriceRecord, PriceError> {
    if record.price < Decimal::ZERO {
        return Err(PriceError::InvalidPrice {
            symbol: record.symbol,
            price: record.price,
        });
    }
    Ok(record)
}

/// Load a `symbol,price` CSV into `cache`, stamping every entry with `now`.
pub fn load_prices_csv<R: Read>(
    reader: R,
    cache: &mut PriceCache,
    source: &str,
    now: DateTime<Utc>,
) -> Result<usize, PriceError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut count = 0;
    for record in rdr.deserialize::<PriceRecord>() {
        let record = checked(record?)?;
        cache.insert(AssetPrice {
            symbol: record.symbol,
            price: record.price,
            fetched_at: now,
            source: source.to_string(),
        });
        count += 1;
    }
    Ok(count)
}

/// Load a JSON object of `{"SYMBOL": price}` into `cache`.
pub fn load_prices_json<R: Read>(
    reader: R,
    cache: &mut PriceCache,
    source: &str,
    now: DateTime<Utc>,
) -> Result<usize, PriceError> {
    let prices: HashMap<String, Decimal> = serde_json::from_reader(reader)?;
    let count = prices.len();
    for (symbol, price) in prices {
        let record = checked(PriceRecord { symbol, price })?;
        cache.insert(AssetPrice {
            symbol: record.symbol,
            price: record.price,
            fetched_at: now,
            source: source.to_string(),
        });
    }
    Ok(count)
}
