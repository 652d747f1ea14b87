//! Persistence sink
//!
//! The durable-storage boundary. The tracker only hands observations
//! over; schema and backend belong to the collaborator behind the
//! trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::Result;

/// Receiver of committed per-cycle observations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Record one observation. Implementations must be upsert-safe for
    /// a given `(instrument_id, observed_at)` pair; retries may
    /// re-deliver.
    async fn record(
        &self,
        instrument_id: &str,
        buy_price: Decimal,
        sell_price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Sink that only logs; stands in until a real backend is wired up
pub struct LogSink;

#[async_trait]
impl PersistenceSink for LogSink {
    async fn record(
        &self,
        instrument_id: &str,
        buy_price: Decimal,
        sell_price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<()> {
        debug!(
            instrument_id = %instrument_id,
            buy_price = %buy_price,
            sell_price = %sell_price,
            observed_at = %observed_at,
            "Observation recorded"
        );
        Ok(())
    }
}
