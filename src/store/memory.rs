//! In-memory trade store for tests and store-less runs

use super::TradeStore;
use crate::ledger::TradeRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps appended trades in memory
#[derive(Clone, Default)]
pub struct MemoryTradeStore {
    trades: Arc<RwLock<Vec<TradeRecord>>>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far
    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.trades.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.trades.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trades.read().await.is_empty()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn append(&self, record: TradeRecord) -> anyhow::Result<()> {
        let mut trades = self.trades.write().await;
        trades.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Direction;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn record(seq: u64) -> TradeRecord {
        let now = Utc::now();
        TradeRecord {
            symbol: "NIFTY 50".to_string(),
            direction: Direction::Long,
            entry_price: dec!(100),
            exit_price: dec!(101),
            quantity: 10,
            pnl: dec!(10),
            entry_time: now,
            exit_time: now,
            session_id: Uuid::new_v4(),
            holding_duration_secs: 30,
            trade_seq: seq,
            time_since_last_trade_secs: 0,
            exit_reason: "MANUAL".to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_accumulates() {
        let store = MemoryTradeStore::new();
        assert!(store.is_empty().await);

        store.append(record(1)).await.unwrap();
        store.append(record(2)).await.unwrap();

        let trades = store.trades().await;
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].trade_seq, 1);
        assert_eq!(trades[1].trade_seq, 2);
    }
}
