//! Durable trade log
//!
//! Closed trades are appended here and never read back by the engine.

mod memory;
mod parquet;

pub use memory::MemoryTradeStore;
pub use parquet::{read_trades, ParquetTradeStore, TradeStoreConfig};

use crate::ledger::TradeRecord;
use async_trait::async_trait;

/// Append-only sink for closed trades.
///
/// Appends are fire-and-forget: a failed write is logged and the realized
/// PnL already returned to the caller is never rolled back.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Append one closed trade
    async fn append(&self, record: TradeRecord) -> anyhow::Result<()>;
}
