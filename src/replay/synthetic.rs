//! Fallback bar generator
//!
//! Used when no dataset is on disk so a demo session can stream without
//! interruption. Yields the same fixed-shape bar forever with advancing
//! timestamps; no state is persisted.

use super::Bar;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const BASE_PRICE: Decimal = dec!(21500);
const HALF_RANGE: Decimal = dec!(5);

/// Endless source of demo bars around a fixed base price
#[derive(Debug)]
pub struct SyntheticBars {
    next_ts: DateTime<Utc>,
    interval: Duration,
}

impl SyntheticBars {
    pub fn new(bar_interval_secs: u64) -> Self {
        Self {
            next_ts: Utc::now(),
            interval: Duration::seconds(bar_interval_secs as i64),
        }
    }

    pub fn next_bar(&mut self) -> Bar {
        let timestamp = self.next_ts;
        self.next_ts += self.interval;

        Bar {
            open: BASE_PRICE,
            high: BASE_PRICE + HALF_RANGE,
            low: BASE_PRICE - HALF_RANGE,
            close: BASE_PRICE,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_keep_shape_and_advance() {
        let mut bars = SyntheticBars::new(60);

        let first = bars.next_bar();
        let second = bars.next_bar();

        assert_eq!(first.open, dec!(21500));
        assert_eq!(first.high, dec!(21505));
        assert_eq!(first.low, dec!(21495));
        assert_eq!(first.close, dec!(21500));

        assert_eq!(second.timestamp - first.timestamp, Duration::seconds(60));
        assert_eq!(second.open, first.open);
    }
}
