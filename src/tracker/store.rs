//! Tracker store
//!
//! The single owner of all mutable tracker state: current quotes,
//! rolling per-instrument history and the notification queue. One
//! writer (the refresh scheduler), many concurrent readers.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::time::timeout;

use super::{
    analytics, notify, CommittedObservation, DemandSupply, HistoryEntry, InstrumentOverview,
    InstrumentQuote, MarginEntry, MarketView, Notification, ProfitEstimate, SortField, SortOrder,
};
use crate::error::{Result, TrackerError};
use crate::feed::RawSnapshot;

/// Fixed capacity of the notification FIFO
pub const NOTIFICATION_CAPACITY: usize = 50;

/// Maximum ids returned by a substring search
const MAX_SEARCH_RESULTS: usize = 10;

/// Trailing window used when counting recent history activity
const RECENT_WINDOW_SECS: i64 = 60;

#[derive(Debug, Default)]
struct TrackerState {
    /// Insertion-ordered so rankings and search results are stable
    quotes: IndexMap<String, InstrumentQuote>,
    /// Rolling history, only for instruments that have had both prices
    history: IndexMap<String, VecDeque<HistoryEntry>>,
    notifications: VecDeque<Notification>,
}

/// Thread-safe current-state map plus bounded rolling history
#[derive(Debug)]
pub struct TrackerStore {
    state: RwLock<TrackerState>,
    history_capacity: usize,
    read_timeout: Duration,
}

impl TrackerStore {
    pub fn new(history_capacity: usize, read_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(TrackerState::default()),
            history_capacity,
            read_timeout,
        }
    }

    /// Acquire the read lock with a bounded wait so a stalled writer
    /// fails individual requests instead of hanging them
    async fn read(&self) -> Result<RwLockReadGuard<'_, TrackerState>> {
        timeout(self.read_timeout, self.state.read())
            .await
            .map_err(|_| TrackerError::LockTimeout)
    }

    /// Commit one full snapshot as an atomic unit.
    ///
    /// Every instrument in the snapshot overwrites its current quote.
    /// Instruments with both prices present also gain a history entry
    /// and are checked for notifications. Instruments absent from the
    /// snapshot keep their last-known quote.
    ///
    /// Returns the observations that gained a history entry so the
    /// caller can hand them to the persistence sink after the lock is
    /// released.
    pub async fn replace_snapshot(
        &self,
        snapshot: &RawSnapshot,
        observed_at: DateTime<Utc>,
    ) -> Vec<CommittedObservation> {
        let mut committed = Vec::new();
        let mut state = self.state.write().await;

        for (id, product) in &snapshot.products {
            let buy_price = product.best_buy();
            let sell_price = product.best_sell();

            state.quotes.insert(
                id.clone(),
                InstrumentQuote {
                    id: id.clone(),
                    buy_price,
                    sell_price,
                    buy_quantity: product.buy_quantity(),
                    sell_quantity: product.sell_quantity(),
                    observed_at,
                },
            );

            // History and notifications need both sides of the quote
            let (Some(buy), Some(sell)) = (buy_price, sell_price) else {
                continue;
            };

            let fired = {
                let history = state.history.entry(id.clone()).or_default();
                let fired = notify::evaluate(id, history.back(), buy, sell, observed_at);

                while history.len() >= self.history_capacity.max(1) {
                    history.pop_front();
                }
                history.push_back(HistoryEntry {
                    timestamp: observed_at,
                    buy_price: buy,
                    sell_price: sell,
                });

                fired
            };

            for notification in fired {
                while state.notifications.len() >= NOTIFICATION_CAPACITY {
                    state.notifications.pop_front();
                }
                state.notifications.push_back(notification);
            }

            committed.push(CommittedObservation {
                instrument_id: id.clone(),
                buy_price: buy,
                sell_price: sell,
                observed_at,
            });
        }

        committed
    }

    /// Current quote for an instrument; id match is case-insensitive
    pub async fn get_quote(&self, id: &str) -> Result<Option<InstrumentQuote>> {
        let state = self.read().await?;

        if let Some(quote) = state.quotes.get(id) {
            return Ok(Some(quote.clone()));
        }

        Ok(state
            .quotes
            .values()
            .find(|quote| quote.id.eq_ignore_ascii_case(id))
            .cloned())
    }

    /// Price history for an instrument, oldest first; empty when unknown
    pub async fn get_history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        let state = self.read().await?;

        let entries = state.history.get(id).or_else(|| {
            state
                .history
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(id))
                .map(|(_, entries)| entries)
        });

        Ok(entries
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Up to 10 ids containing `query` case-insensitively, in store
    /// iteration order
    pub async fn search_ids(&self, query: &str) -> Result<Vec<String>> {
        let query = query.to_ascii_lowercase();
        let state = self.read().await?;

        Ok(state
            .quotes
            .keys()
            .filter(|id| id.to_ascii_lowercase().contains(&query))
            .take(MAX_SEARCH_RESULTS)
            .cloned()
            .collect())
    }

    /// Dashboard row for the first instrument whose id contains `query`
    pub async fn instrument_overview(&self, query: &str) -> Result<Option<InstrumentOverview>> {
        let query = query.to_ascii_lowercase();
        let state = self.read().await?;

        Ok(state
            .quotes
            .values()
            .find(|quote| quote.id.to_ascii_lowercase().contains(&query))
            .map(|quote| InstrumentOverview {
                id: quote.id.clone(),
                buy_price: quote.buy_price,
                sell_price: quote.sell_price,
                margin: analytics::margin(quote),
                demand: quote.buy_quantity,
                supply: quote.sell_quantity,
            }))
    }

    /// Aggregated order sizes for an instrument
    pub async fn demand_supply(&self, id: &str) -> Result<Option<DemandSupply>> {
        Ok(self.get_quote(id).await?.map(|quote| DemandSupply {
            demand: quote.buy_quantity,
            supply: quote.sell_quantity,
        }))
    }

    /// Notifications oldest first, at most [`NOTIFICATION_CAPACITY`]
    pub async fn recent_notifications(&self) -> Result<Vec<Notification>> {
        let state = self.read().await?;
        Ok(state.notifications.iter().cloned().collect())
    }

    /// Build a consistent point-in-time view for analytics under one
    /// read-lock acquisition
    pub async fn market_view(&self, now: DateTime<Utc>) -> Result<MarketView> {
        let state = self.read().await?;
        let cutoff = now - ChronoDuration::seconds(RECENT_WINDOW_SECS);

        let quotes: Vec<InstrumentQuote> = state.quotes.values().cloned().collect();
        let recent_entries: Vec<usize> = state
            .history
            .values()
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take_while(|entry| entry.timestamp >= cutoff)
                    .count()
            })
            .collect();

        Ok(MarketView {
            taken_at: now,
            quotes,
            recent_entries,
        })
    }

    /// Top-10 margin ranking over instruments with both prices present
    pub async fn rank(&self, field: SortField, order: SortOrder) -> Result<Vec<MarginEntry>> {
        let view = self.market_view(Utc::now()).await?;
        Ok(analytics::top_margins(&view, field, order))
    }

    /// Difficulty-adjusted profit estimates for a coin budget, most
    /// profitable first
    pub async fn profitability(&self, coins: f64) -> Result<Vec<ProfitEstimate>> {
        let view = self.market_view(Utc::now()).await?;
        Ok(analytics::profitability(&view, coins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{OrderSummary, RawProduct};
    use crate::tracker::NotificationKind;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, amount: u64) -> OrderSummary {
        OrderSummary {
            price_per_unit: Some(price),
            amount,
            orders: 1,
        }
    }

    fn product(buy: Decimal, sell: Decimal) -> RawProduct {
        RawProduct {
            buy_summary: Some(vec![level(buy, 100)]),
            sell_summary: Some(vec![level(sell, 100)]),
        }
    }

    fn snapshot<I: Into<String>>(entries: Vec<(I, RawProduct)>) -> RawSnapshot {
        RawSnapshot {
            products: entries
                .into_iter()
                .map(|(id, product)| (id.into(), product))
                .collect(),
        }
    }

    fn store() -> TrackerStore {
        TrackerStore::new(28_800, Duration::from_secs(5))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_two_cycle_history_notification_and_margin() {
        let store = store();

        store
            .replace_snapshot(
                &snapshot(vec![("ENCHANTED_GOLD", product(dec!(100), dec!(90)))]),
                at(0),
            )
            .await;
        store
            .replace_snapshot(
                &snapshot(vec![("ENCHANTED_GOLD", product(dec!(108), dec!(90)))]),
                at(61),
            )
            .await;

        let history = store.get_history("ENCHANTED_GOLD").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].buy_price, dec!(100));
        assert_eq!(history[1].buy_price, dec!(108));

        let notifications = store.recent_notifications().await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::BuyChange);
        assert_eq!(notifications[0].old_price, dec!(100));
        assert_eq!(notifications[0].new_price, dec!(108));

        let quote = store.get_quote("ENCHANTED_GOLD").await.unwrap().unwrap();
        assert_eq!(analytics::margin(&quote), Some(dec!(18.00)));
    }

    #[tokio::test]
    async fn test_history_is_a_ring_buffer() {
        let store = TrackerStore::new(3, Duration::from_secs(5));

        for cycle in 0..5 {
            store
                .replace_snapshot(
                    &snapshot(vec![("WHEAT", product(dec!(10), dec!(8)))]),
                    at(cycle * 60),
                )
                .await;
        }

        let history = store.get_history("WHEAT").await.unwrap();
        assert_eq!(history.len(), 3);
        // Oldest evicted first: cycles 0 and 1 are gone
        assert_eq!(history[0].timestamp, at(120));
        assert_eq!(history[2].timestamp, at(240));
    }

    #[tokio::test]
    async fn test_missing_instrument_keeps_last_known_quote() {
        let store = store();

        store
            .replace_snapshot(
                &snapshot(vec![
                    ("WHEAT", product(dec!(10), dec!(8))),
                    ("CARROT", product(dec!(4), dec!(3))),
                ]),
                at(0),
            )
            .await;
        store
            .replace_snapshot(
                &snapshot(vec![("CARROT", product(dec!(5), dec!(3)))]),
                at(60),
            )
            .await;

        let wheat = store.get_quote("WHEAT").await.unwrap().unwrap();
        assert_eq!(wheat.buy_price, Some(dec!(10)));
        assert_eq!(wheat.observed_at, at(0));

        let history = store.get_history("WHEAT").await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_one_sided_quote_skips_history_but_updates_quote() {
        let store = store();

        let one_sided = RawProduct {
            buy_summary: Some(vec![level(dec!(42), 10)]),
            sell_summary: None,
        };
        let committed = store
            .replace_snapshot(&snapshot(vec![("STOCK_OF_STONKS", one_sided)]), at(0))
            .await;

        assert!(committed.is_empty());

        let quote = store.get_quote("STOCK_OF_STONKS").await.unwrap().unwrap();
        assert_eq!(quote.buy_price, Some(dec!(42)));
        assert_eq!(quote.sell_price, None);

        assert!(store.get_history("STOCK_OF_STONKS").await.unwrap().is_empty());
        assert!(store.recent_notifications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_queue_is_bounded_fifo() {
        let store = store();

        let first = snapshot(
            (0..60)
                .map(|i| (format!("ITEM_{i}"), product(dec!(100), dec!(90))))
                .collect(),
        );
        let second = snapshot(
            (0..60)
                .map(|i| (format!("ITEM_{i}"), product(dec!(110), dec!(90))))
                .collect(),
        );

        store.replace_snapshot(&first, at(0)).await;
        store.replace_snapshot(&second, at(60)).await;

        let notifications = store.recent_notifications().await.unwrap();
        assert_eq!(notifications.len(), NOTIFICATION_CAPACITY);
        // 60 fired, oldest 10 evicted
        assert_eq!(notifications[0].instrument_id, "ITEM_10");
        assert_eq!(notifications[49].instrument_id, "ITEM_59");
    }

    #[tokio::test]
    async fn test_search_ids_case_insensitive_and_capped() {
        let store = store();

        let mut entries: Vec<(String, RawProduct)> = (0..15)
            .map(|i| (format!("IRON_SWORD_{i}"), product(dec!(10), dec!(8))))
            .collect();
        entries.push(("WHEAT".to_string(), product(dec!(10), dec!(8))));
        store.replace_snapshot(&snapshot(entries), at(0)).await;

        let hits = store.search_ids("sword").await.unwrap();
        assert_eq!(hits.len(), 10);
        assert!(hits.iter().all(|id| id.to_lowercase().contains("sword")));
        assert_eq!(hits[0], "IRON_SWORD_0");

        assert!(store.search_ids("potato").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_quote_case_insensitive_and_not_found() {
        let store = store();
        store
            .replace_snapshot(
                &snapshot(vec![("ENCHANTED_GOLD", product(dec!(100), dec!(90)))]),
                at(0),
            )
            .await;

        let quote = store.get_quote("enchanted_gold").await.unwrap();
        assert_eq!(quote.unwrap().id, "ENCHANTED_GOLD");

        assert!(store.get_quote("NO_SUCH_ITEM").await.unwrap().is_none());
        assert!(store.get_history("NO_SUCH_ITEM").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_demand_supply_totals() {
        let store = store();

        let rich_book = RawProduct {
            buy_summary: Some(vec![level(dec!(100), 320), level(dec!(101), 80)]),
            sell_summary: Some(vec![level(dec!(90), 150)]),
        };
        store
            .replace_snapshot(&snapshot(vec![("ENCHANTED_GOLD", rich_book)]), at(0))
            .await;

        let totals = store
            .demand_supply("ENCHANTED_GOLD")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(totals.demand, 400);
        assert_eq!(totals.supply, 150);
    }

    #[tokio::test]
    async fn test_instrument_overview_by_substring() {
        let store = store();
        store
            .replace_snapshot(
                &snapshot(vec![("ENCHANTED_GOLD", product(dec!(100.507), dec!(90)))]),
                at(0),
            )
            .await;

        let overview = store.instrument_overview("gold").await.unwrap().unwrap();
        assert_eq!(overview.id, "ENCHANTED_GOLD");
        assert_eq!(overview.margin, Some(dec!(10.51)));

        assert!(store.instrument_overview("potato").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_path_times_out_instead_of_hanging() {
        let store = TrackerStore::new(28_800, Duration::from_millis(10));
        store
            .replace_snapshot(
                &snapshot(vec![("ENCHANTED_GOLD", product(dec!(100), dec!(90)))]),
                at(0),
            )
            .await;

        // A stalled writer holds the lock across the read attempt
        let writer = store.state.write().await;

        let result = store.get_quote("ENCHANTED_GOLD").await;
        assert!(matches!(result, Err(TrackerError::LockTimeout)));

        // Reads succeed again once the writer releases
        drop(writer);
        assert!(store.get_quote("ENCHANTED_GOLD").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_market_view_counts_only_recent_entries() {
        let store = store();

        store
            .replace_snapshot(
                &snapshot(vec![("WHEAT", product(dec!(10), dec!(8)))]),
                at(0),
            )
            .await;
        store
            .replace_snapshot(
                &snapshot(vec![("WHEAT", product(dec!(10), dec!(8)))]),
                at(100),
            )
            .await;

        // At t=130 only the t=100 entry is inside the 60s window
        let view = store.market_view(at(130)).await.unwrap();
        assert_eq!(view.recent_entries, vec![1]);

        let view = store.market_view(at(400)).await.unwrap();
        assert_eq!(view.recent_entries, vec![0]);
    }
}
