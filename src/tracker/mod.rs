//! Tracker module
//!
//! Owns the current market view, the rolling per-instrument history and
//! the price-change notification queue, and derives analytics from them.

pub mod analytics;
mod notify;
mod store;

pub use analytics::{MarginEntry, ProfitEstimate, SortField, SortOrder};
pub use notify::PRICE_MOVE_THRESHOLD;
pub use store::{TrackerStore, NOTIFICATION_CAPACITY};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Current observed state for one instrument
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentQuote {
    pub id: String,
    /// Best buy price; `None` means the feed reported no buy side,
    /// not a price of zero
    pub buy_price: Option<Decimal>,
    /// Best sell price, same absence semantics
    pub sell_price: Option<Decimal>,
    /// Total buy-side order size (demand)
    pub buy_quantity: u64,
    /// Total sell-side order size (supply)
    pub sell_quantity: u64,
    pub observed_at: DateTime<Utc>,
}

/// One point of the rolling per-instrument price history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

/// Which side of the quote moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BuyChange,
    SellChange,
}

/// A noticeable price move between two consecutive observations
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub instrument_id: String,
    pub kind: NotificationKind,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Aggregated order sizes for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemandSupply {
    pub demand: u64,
    pub supply: u64,
}

/// Dashboard row for a single instrument looked up by name
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentOverview {
    pub id: String,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    /// Present only when both prices are
    pub margin: Option<Decimal>,
    pub demand: u64,
    pub supply: u64,
}

/// An observation that gained a history entry this cycle and is ready
/// for durable storage
#[derive(Debug, Clone)]
pub struct CommittedObservation {
    pub instrument_id: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// Consistent point-in-time view of the store for analytics.
///
/// Built under a single read-lock acquisition so it never mixes two
/// refresh cycles.
#[derive(Debug, Clone)]
pub struct MarketView {
    pub taken_at: DateTime<Utc>,
    /// All current quotes in store iteration order
    pub quotes: Vec<InstrumentQuote>,
    /// Per instrument with history, how many entries landed within the
    /// trailing activity window of `taken_at`
    pub recent_entries: Vec<usize>,
}
