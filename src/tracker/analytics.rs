//! Derived metrics
//!
//! Stateless by design: every function recomputes from a [`MarketView`]
//! so results are never cached stale across refresh cycles.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{InstrumentQuote, MarketView};

/// Maximum entries returned by a ranking
const TOP_RESULTS: usize = 10;

/// Field a margin ranking is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Margin,
    BuyPrice,
    SellPrice,
}

impl From<&str> for SortField {
    /// Permissive: unrecognized values fall back to margin
    fn from(value: &str) -> Self {
        match value {
            "buy_price" => SortField::BuyPrice,
            "sell_price" => SortField::SellPrice,
            _ => SortField::Margin,
        }
    }
}

/// Ranking direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<&str> for SortOrder {
    /// Permissive: anything but "asc" is descending
    fn from(value: &str) -> Self {
        match value {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// One row of a margin ranking
#[derive(Debug, Clone, Serialize)]
pub struct MarginEntry {
    pub instrument_id: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub margin: Decimal,
}

/// Difficulty-adjusted profit estimate for one instrument.
///
/// An estimate, not a guarantee: assumes one full margin round-trip per
/// difficulty unit of elapsed time.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitEstimate {
    pub instrument_id: String,
    pub profit_per_minute: f64,
    pub profit_per_hour: f64,
}

/// Margin of a quote, rounded to 2 decimals; needs both prices
pub fn margin(quote: &InstrumentQuote) -> Option<Decimal> {
    Some((quote.buy_price? - quote.sell_price?).round_dp(2))
}

/// Top-10 ranking over instruments with both prices present.
///
/// The sort is stable: equal keys keep the view's iteration order.
pub fn top_margins(view: &MarketView, field: SortField, order: SortOrder) -> Vec<MarginEntry> {
    let mut entries: Vec<MarginEntry> = view
        .quotes
        .iter()
        .filter_map(|quote| {
            let buy_price = quote.buy_price?;
            let sell_price = quote.sell_price?;
            Some(MarginEntry {
                instrument_id: quote.id.clone(),
                buy_price,
                sell_price,
                margin: (buy_price - sell_price).round_dp(2),
            })
        })
        .collect();

    let key = |entry: &MarginEntry| match field {
        SortField::Margin => entry.margin,
        SortField::BuyPrice => entry.buy_price,
        SortField::SellPrice => entry.sell_price,
    };
    match order {
        SortOrder::Asc => entries.sort_by(|a, b| key(a).cmp(&key(b))),
        SortOrder::Desc => entries.sort_by(|a, b| key(b).cmp(&key(a))),
    }

    entries.truncate(TOP_RESULTS);
    entries
}

/// Average history entries per instrument inside the trailing activity
/// window, reported for the buy and sell side.
///
/// Both rates come from the same window and are equal by construction;
/// the pair is kept because difficulty averages them.
pub fn order_rates(view: &MarketView) -> (f64, f64) {
    if view.recent_entries.is_empty() {
        return (0.0, 0.0);
    }

    let total: usize = view.recent_entries.iter().sum();
    let rate = total as f64 / view.recent_entries.len() as f64;
    (rate, rate)
}

/// Velocity-derived divisor for profit estimates; floored at 1 so
/// downstream division is always safe
pub fn difficulty(view: &MarketView) -> f64 {
    let (buy_rate, sell_rate) = order_rates(view);
    if buy_rate + sell_rate > 0.0 {
        (buy_rate + sell_rate) / 2.0
    } else {
        1.0
    }
}

/// Profit estimates for a coin budget, most profitable first
pub fn profitability(view: &MarketView, coins: f64) -> Vec<ProfitEstimate> {
    let difficulty = difficulty(view);

    let mut estimates: Vec<ProfitEstimate> = view
        .quotes
        .iter()
        .filter_map(|quote| {
            let margin = margin(quote)?.to_f64()?;
            let profit_per_minute = (margin / difficulty) * coins;
            Some(ProfitEstimate {
                instrument_id: quote.id.clone(),
                profit_per_minute,
                profit_per_hour: profit_per_minute * 60.0,
            })
        })
        .collect();

    estimates.sort_by(|a, b| b.profit_per_hour.total_cmp(&a.profit_per_hour));
    estimates
}
