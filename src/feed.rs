//! Upstream snapshot feed
//!
//! Wire types for the bazaar snapshot payload and the HTTP client that
//! fetches it once per refresh cycle.

use async_trait::async_trait;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::error::{Result, TrackerError};

/// One aggregated order level in a product summary
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSummary {
    /// Price per unit; absent when the feed sends a missing or
    /// non-numeric value, which is distinct from a price of zero
    #[serde(
        rename = "pricePerUnit",
        default,
        deserialize_with = "deserialize_lenient_price"
    )]
    pub price_per_unit: Option<Decimal>,

    /// Aggregated order size at this level
    #[serde(default)]
    pub amount: u64,

    /// Number of orders aggregated into this level
    #[serde(default)]
    pub orders: u32,
}

/// Raw per-instrument fields from one snapshot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub buy_summary: Option<Vec<OrderSummary>>,

    #[serde(default)]
    pub sell_summary: Option<Vec<OrderSummary>>,
}

impl RawProduct {
    /// Best buy price: price-per-unit of the first buy-side entry
    pub fn best_buy(&self) -> Option<Decimal> {
        Self::best_price(&self.buy_summary)
    }

    /// Best sell price: price-per-unit of the first sell-side entry
    pub fn best_sell(&self) -> Option<Decimal> {
        Self::best_price(&self.sell_summary)
    }

    /// Total buy-side order size (demand); missing list contributes 0
    pub fn buy_quantity(&self) -> u64 {
        Self::total_quantity(&self.buy_summary)
    }

    /// Total sell-side order size (supply); missing list contributes 0
    pub fn sell_quantity(&self) -> u64 {
        Self::total_quantity(&self.sell_summary)
    }

    fn best_price(summary: &Option<Vec<OrderSummary>>) -> Option<Decimal> {
        summary
            .as_ref()
            .and_then(|levels| levels.first())
            .and_then(|level| level.price_per_unit)
    }

    fn total_quantity(summary: &Option<Vec<OrderSummary>>) -> u64 {
        summary
            .as_ref()
            .map(|levels| levels.iter().map(|level| level.amount).sum())
            .unwrap_or(0)
    }
}

/// One full market snapshot as returned by the feed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub products: IndexMap<String, RawProduct>,
}

/// Source of market snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetch one full snapshot. On any failure the caller must leave
    /// tracker state untouched.
    async fn fetch(&self) -> Result<RawSnapshot>;
}

/// HTTP snapshot fetcher with a bounded request timeout
pub struct HttpFeed {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFeed {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl MarketFeed for HttpFeed {
    async fn fetch(&self) -> Result<RawSnapshot> {
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Feed(format!(
                "feed returned status {status}"
            )));
        }

        let body = response.text().await?;
        let snapshot: RawSnapshot = serde_json::from_str(&body)?;
        Ok(snapshot)
    }
}

/// Deserialize a price that may arrive missing or non-numeric; bad
/// values become `None` rather than failing the whole snapshot
fn deserialize_lenient_price<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<Decimal>(value).ok())
}
