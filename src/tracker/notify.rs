//! Price-change notification rules

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{HistoryEntry, Notification, NotificationKind};

/// Absolute move, in whole currency units, that counts as noticeable.
/// Deliberately coarse: a "something happened" signal, not a tuned alert.
pub const PRICE_MOVE_THRESHOLD: u32 = 5;

/// Compare a new observation against the immediately preceding history
/// entry. Returns 0-2 notifications; none on first observation.
pub(super) fn evaluate(
    instrument_id: &str,
    previous: Option<&HistoryEntry>,
    buy_price: Decimal,
    sell_price: Decimal,
    timestamp: DateTime<Utc>,
) -> Vec<Notification> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let threshold = Decimal::from(PRICE_MOVE_THRESHOLD);
    let mut fired = Vec::new();

    if (previous.buy_price - buy_price).abs() > threshold {
        fired.push(Notification {
            instrument_id: instrument_id.to_string(),
            kind: NotificationKind::BuyChange,
            old_price: previous.buy_price,
            new_price: buy_price,
            timestamp,
        });
    }

    if (previous.sell_price - sell_price).abs() > threshold {
        fired.push(Notification {
            instrument_id: instrument_id.to_string(),
            kind: NotificationKind::SellChange,
            old_price: previous.sell_price,
            new_price: sell_price,
            timestamp,
        });
    }

    fired
}
