//! Bazaar Market Tracker Library
//!
//! This crate polls a bazaar snapshot feed, maintains an in-memory
//! concurrency-safe view of current quotes with a bounded rolling
//! history per instrument, and derives flip analytics (margins,
//! rankings, profitability estimates, price-change notifications) for
//! read-heavy queries.

pub mod config;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod sink;
pub mod tracker;

pub use config::Config;
pub use error::{Result, TrackerError};
pub use feed::{HttpFeed, MarketFeed, OrderSummary, RawProduct, RawSnapshot};
pub use scheduler::{CycleOutcome, RefreshScheduler};
pub use sink::{LogSink, PersistenceSink};
pub use tracker::{
    CommittedObservation, DemandSupply, HistoryEntry, InstrumentOverview, InstrumentQuote,
    MarginEntry, MarketView, Notification, NotificationKind, ProfitEstimate, SortField, SortOrder,
    TrackerStore,
};
