//! Position and trade record types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// PnL sign: +1 for long, -1 for short
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => -Decimal::ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            other => anyhow::bail!("unknown direction: {}", other),
        }
    }
}

/// The single open position of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Trade side
    pub direction: Direction,
    /// Entry price
    pub entry_price: Decimal,
    /// Position size
    pub quantity: i64,
    /// Entry timestamp
    pub entry_time: DateTime<Utc>,
}

/// A closed trade, appended to the trade store.
///
/// Immutable after creation; only long closes produce one (see
/// [`crate::ledger::PositionLedger::close`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: i64,
    pub pnl: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// Session that produced the trade
    pub session_id: Uuid,
    /// Seconds the position was held
    pub holding_duration_secs: i64,
    /// 1-based position of this trade within its session
    pub trade_seq: u64,
    /// Seconds since the previous close in this session, 0 for the first
    pub time_since_last_trade_secs: i64,
    pub exit_reason: String,
}
