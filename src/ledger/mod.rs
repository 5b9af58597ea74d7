//! Per-session position ledger
//!
//! Owns the single open position and realized-PnL bookkeeping for one
//! streaming session. `open` always enters a long, overwriting whatever is
//! held without realizing it; `close` realizes an open long or flips
//! flat/short into a fresh short. Only long closes produce a trade record —
//! the short side of the lifecycle is not wired to the log.

mod types;

pub use types::{Direction, Position, TradeRecord};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Result of a close call: realized PnL, plus the trade record when a long
/// position was actually closed.
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    pub realized_pnl: Decimal,
    pub record: Option<TradeRecord>,
}

/// Tracks the one position a session may hold
pub struct PositionLedger {
    symbol: String,
    session_id: Uuid,
    position: Option<Position>,
    trade_seq: u64,
    last_close_time: Option<DateTime<Utc>>,
}

impl PositionLedger {
    /// Create a flat ledger for one session
    pub fn new(symbol: impl Into<String>, session_id: Uuid) -> Self {
        Self {
            symbol: symbol.into(),
            session_id,
            position: None,
            trade_seq: 0,
            last_close_time: None,
        }
    }

    /// Currently held position, if any
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Closed trades so far this session
    pub fn trade_count(&self) -> u64 {
        self.trade_seq
    }

    /// Enter a long at `price`.
    ///
    /// Overwrites any held position, including an open short, without
    /// realizing it. Emits no PnL.
    pub fn open(&mut self, price: Decimal, quantity: i64) {
        self.position = Some(Position {
            direction: Direction::Long,
            entry_price: price,
            quantity,
            entry_time: Utc::now(),
        });
        tracing::info!(%price, quantity, "buy filled, long opened");
    }

    /// Close an open long, or open a short when no long is held.
    ///
    /// A long close realizes `(price - entry) * quantity` and returns the
    /// trade record for the caller to persist. Any other state opens a
    /// short at `price` and returns zero PnL with no record. Never fails.
    pub fn close(&mut self, price: Decimal, quantity: i64) -> CloseOutcome {
        match self.position.take() {
            Some(pos) if pos.direction == Direction::Long => {
                let now = Utc::now();
                let pnl =
                    (price - pos.entry_price) * Decimal::from(pos.quantity) * pos.direction.sign();
                self.trade_seq += 1;
                let time_since_last = self
                    .last_close_time
                    .map(|t| (now - t).num_seconds())
                    .unwrap_or(0);

                let record = TradeRecord {
                    symbol: self.symbol.clone(),
                    direction: pos.direction,
                    entry_price: pos.entry_price,
                    exit_price: price,
                    quantity: pos.quantity,
                    pnl,
                    entry_time: pos.entry_time,
                    exit_time: now,
                    session_id: self.session_id,
                    holding_duration_secs: (now - pos.entry_time).num_seconds(),
                    trade_seq: self.trade_seq,
                    time_since_last_trade_secs: time_since_last,
                    exit_reason: "MANUAL".to_string(),
                };

                self.last_close_time = Some(now);
                tracing::info!(%price, %pnl, seq = self.trade_seq, "long closed");

                CloseOutcome {
                    realized_pnl: pnl,
                    record: Some(record),
                }
            }
            _ => {
                self.position = Some(Position {
                    direction: Direction::Short,
                    entry_price: price,
                    quantity,
                    entry_time: Utc::now(),
                });
                tracing::info!(%price, quantity, "sell filled, short opened");

                CloseOutcome {
                    realized_pnl: Decimal::ZERO,
                    record: None,
                }
            }
        }
    }

    /// Unrealized PnL at `price`; zero when flat. Pure and idempotent.
    pub fn mark_to_market(&self, price: Decimal) -> Decimal {
        match &self.position {
            Some(pos) => {
                (price - pos.entry_price) * Decimal::from(pos.quantity) * pos.direction.sign()
            }
            None => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> PositionLedger {
        PositionLedger::new("NIFTY 50", Uuid::new_v4())
    }

    #[test]
    fn test_starts_flat() {
        let ledger = ledger();
        assert!(ledger.is_flat());
        assert_eq!(ledger.mark_to_market(dec!(100)), dec!(0));
        assert_eq!(ledger.trade_count(), 0);
    }

    #[test]
    fn test_long_round_trip() {
        // Open at 100, mark at 110, close at 110
        let mut ledger = ledger();
        ledger.open(dec!(100), 10);

        let pos = ledger.position().unwrap();
        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.entry_price, dec!(100));

        assert_eq!(ledger.mark_to_market(dec!(110)), dec!(100));

        let outcome = ledger.close(dec!(110), 10);
        assert_eq!(outcome.realized_pnl, dec!(100));
        assert!(ledger.is_flat());

        let record = outcome.record.unwrap();
        assert_eq!(record.pnl, dec!(100));
        assert_eq!(record.trade_seq, 1);
        assert_eq!(record.entry_price, dec!(100));
        assert_eq!(record.exit_price, dec!(110));
        assert_eq!(record.direction, Direction::Long);
        assert_eq!(record.time_since_last_trade_secs, 0);
        assert_eq!(record.exit_reason, "MANUAL");
    }

    #[test]
    fn test_close_while_flat_opens_short() {
        let mut ledger = ledger();
        let outcome = ledger.close(dec!(100), 5);

        assert_eq!(outcome.realized_pnl, dec!(0));
        assert!(outcome.record.is_none());

        let pos = ledger.position().unwrap();
        assert_eq!(pos.direction, Direction::Short);
        assert_eq!(pos.entry_price, dec!(100));
        assert_eq!(pos.quantity, 5);
    }

    #[test]
    fn test_short_marks_negative_on_rally() {
        let mut ledger = ledger();
        ledger.close(dec!(100), 5);

        assert_eq!(ledger.mark_to_market(dec!(110)), dec!(-50));
        assert_eq!(ledger.mark_to_market(dec!(90)), dec!(50));
    }

    #[test]
    fn test_immediate_close_realizes_zero() {
        let mut ledger = ledger();
        ledger.open(dec!(100), 10);
        let outcome = ledger.close(dec!(100), 10);

        assert_eq!(outcome.realized_pnl, dec!(0));
        assert_eq!(outcome.record.unwrap().pnl, dec!(0));
    }

    #[test]
    fn test_mark_to_market_is_idempotent() {
        let mut ledger = ledger();
        ledger.open(dec!(100), 10);

        let first = ledger.mark_to_market(dec!(104.5));
        let second = ledger.mark_to_market(dec!(104.5));
        assert_eq!(first, second);
        assert_eq!(first, dec!(45));
    }

    #[test]
    fn test_trade_sequence_numbers() {
        let mut ledger = ledger();

        for expected_seq in 1..=3u64 {
            ledger.open(dec!(100), 1);
            let outcome = ledger.close(dec!(101), 1);
            assert_eq!(outcome.record.unwrap().trade_seq, expected_seq);
        }
        assert_eq!(ledger.trade_count(), 3);
    }

    #[test]
    fn test_buy_overwrites_short_without_realizing() {
        // Reference behavior: the discarded short produces no record
        let mut ledger = ledger();
        ledger.close(dec!(100), 5);
        assert_eq!(ledger.position().unwrap().direction, Direction::Short);

        ledger.open(dec!(98), 7);

        let pos = ledger.position().unwrap();
        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.entry_price, dec!(98));
        assert_eq!(pos.quantity, 7);
        assert_eq!(ledger.trade_count(), 0);
    }

    #[test]
    fn test_sell_while_short_replaces_short() {
        let mut ledger = ledger();
        ledger.close(dec!(100), 5);
        let outcome = ledger.close(dec!(95), 8);

        assert_eq!(outcome.realized_pnl, dec!(0));
        assert!(outcome.record.is_none());

        let pos = ledger.position().unwrap();
        assert_eq!(pos.direction, Direction::Short);
        assert_eq!(pos.entry_price, dec!(95));
        assert_eq!(pos.quantity, 8);
    }

    #[test]
    fn test_close_uses_position_quantity_for_pnl() {
        // PnL is sized by the held quantity, not the close argument
        let mut ledger = ledger();
        ledger.open(dec!(100), 10);
        let outcome = ledger.close(dec!(105), 3);

        assert_eq!(outcome.realized_pnl, dec!(50));
    }
}
