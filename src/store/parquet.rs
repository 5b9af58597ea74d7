//! Parquet trade log with buffered background writes

use super::TradeStore;
use crate::ledger::{Direction, TradeRecord};
use arrow::array::{
    ArrayRef, Int64Array, StringArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Configuration for the Parquet trade log
#[derive(Debug, Clone)]
pub struct TradeStoreConfig {
    /// Output directory for trade files
    pub output_dir: PathBuf,
    /// Buffered records before a flush
    pub buffer_size: usize,
    /// Maximum time between flushes
    pub flush_interval_secs: u64,
}

impl Default for TradeStoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./trades"),
            buffer_size: 64,
            flush_interval_secs: 30,
        }
    }
}

/// Closed-trade schema
pub fn trade_schema() -> Schema {
    Schema::new(vec![
        Field::new("symbol", DataType::Utf8, false),
        Field::new("direction", DataType::Utf8, false),
        Field::new("entry_price", DataType::Utf8, false), // Store as string for Decimal precision
        Field::new("exit_price", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("pnl", DataType::Utf8, false),
        Field::new(
            "entry_time",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new(
            "exit_time",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("session_id", DataType::Utf8, false),
        Field::new("holding_duration_secs", DataType::Int64, false),
        Field::new("trade_seq", DataType::UInt64, false),
        Field::new("time_since_last_trade_secs", DataType::Int64, false),
        Field::new("exit_reason", DataType::Utf8, false),
    ])
}

/// Writes closed trades to timestamped Parquet files via a background task
pub struct ParquetTradeStore {
    tx: mpsc::Sender<TradeRecord>,
}

impl ParquetTradeStore {
    /// Create the store and spawn its writer task
    pub fn new(config: TradeStoreConfig) -> Self {
        let (tx, rx) = mpsc::channel(1024);
        tokio::spawn(run_writer(rx, config));
        Self { tx }
    }
}

#[async_trait]
impl TradeStore for ParquetTradeStore {
    async fn append(&self, record: TradeRecord) -> anyhow::Result<()> {
        // Fire-and-forget: a full or closed channel drops the record
        if let Err(e) = self.tx.try_send(record) {
            tracing::warn!(error = %e, "trade log append dropped");
        }
        Ok(())
    }
}

async fn run_writer(mut rx: mpsc::Receiver<TradeRecord>, config: TradeStoreConfig) {
    let mut buffer: Vec<TradeRecord> = Vec::with_capacity(config.buffer_size);
    let flush_interval = tokio::time::Duration::from_secs(config.flush_interval_secs);

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Some(record) => {
                        buffer.push(record);
                        if buffer.len() >= config.buffer_size {
                            flush(&mut buffer, &config);
                        }
                    }
                    None => {
                        flush(&mut buffer, &config);
                        tracing::info!("trade writer shutting down");
                        break;
                    }
                }
            }

            _ = tokio::time::sleep(flush_interval) => {
                flush(&mut buffer, &config);
            }
        }
    }
}

fn flush(buffer: &mut Vec<TradeRecord>, config: &TradeStoreConfig) {
    if buffer.is_empty() {
        return;
    }

    let path = trade_file_path(&config.output_dir, Utc::now());
    match write_trades(&path, buffer) {
        Ok(()) => {
            tracing::debug!(path = ?path, count = buffer.len(), "Wrote trades to Parquet");
        }
        Err(e) => {
            tracing::warn!(error = %e, "trade log flush failed");
        }
    }
    buffer.clear();
}

/// Generate the file path for a flush at `timestamp`
pub fn trade_file_path(output_dir: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    let filename = format!("trades_{}.parquet", timestamp.format("%Y%m%d_%H%M%S"));
    output_dir.join(filename)
}

/// Write trade records to a Parquet file
pub fn write_trades(path: &Path, trades: &[TradeRecord]) -> anyhow::Result<()> {
    if trades.is_empty() {
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let schema = Arc::new(trade_schema());
    let file = File::create(path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let symbols: Vec<&str> = trades.iter().map(|t| t.symbol.as_str()).collect();
    let directions: Vec<&str> = trades.iter().map(|t| t.direction.as_str()).collect();
    let entry_prices: Vec<String> = trades.iter().map(|t| t.entry_price.to_string()).collect();
    let exit_prices: Vec<String> = trades.iter().map(|t| t.exit_price.to_string()).collect();
    let quantities: Vec<i64> = trades.iter().map(|t| t.quantity).collect();
    let pnls: Vec<String> = trades.iter().map(|t| t.pnl.to_string()).collect();
    let entry_times: Vec<i64> = trades
        .iter()
        .map(|t| t.entry_time.timestamp_micros())
        .collect();
    let exit_times: Vec<i64> = trades
        .iter()
        .map(|t| t.exit_time.timestamp_micros())
        .collect();
    let session_ids: Vec<String> = trades.iter().map(|t| t.session_id.to_string()).collect();
    let holding: Vec<i64> = trades.iter().map(|t| t.holding_duration_secs).collect();
    let seqs: Vec<u64> = trades.iter().map(|t| t.trade_seq).collect();
    let since_last: Vec<i64> = trades
        .iter()
        .map(|t| t.time_since_last_trade_secs)
        .collect();
    let reasons: Vec<&str> = trades.iter().map(|t| t.exit_reason.as_str()).collect();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(symbols)) as ArrayRef,
            Arc::new(StringArray::from(directions)) as ArrayRef,
            Arc::new(StringArray::from(
                entry_prices.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(StringArray::from(
                exit_prices.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(Int64Array::from(quantities)) as ArrayRef,
            Arc::new(StringArray::from(
                pnls.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(TimestampMicrosecondArray::from(entry_times).with_timezone("UTC")) as ArrayRef,
            Arc::new(TimestampMicrosecondArray::from(exit_times).with_timezone("UTC")) as ArrayRef,
            Arc::new(StringArray::from(
                session_ids.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(Int64Array::from(holding)) as ArrayRef,
            Arc::new(UInt64Array::from(seqs)) as ArrayRef,
            Arc::new(Int64Array::from(since_last)) as ArrayRef,
            Arc::new(StringArray::from(reasons)) as ArrayRef,
        ],
    )?;

    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

/// Read trade records back from a Parquet file. Not used by the engine;
/// kept for tooling and tests.
pub fn read_trades(path: &Path) -> anyhow::Result<Vec<TradeRecord>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::str::FromStr;

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut trades = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;

        let strings = |idx: usize| -> anyhow::Result<&StringArray> {
            batch
                .column(idx)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| anyhow::anyhow!("invalid string column {}", idx))
        };
        let int64s = |idx: usize| -> anyhow::Result<&Int64Array> {
            batch
                .column(idx)
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| anyhow::anyhow!("invalid int64 column {}", idx))
        };
        let times = |idx: usize| -> anyhow::Result<&TimestampMicrosecondArray> {
            batch
                .column(idx)
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| anyhow::anyhow!("invalid timestamp column {}", idx))
        };

        let symbols = strings(0)?;
        let directions = strings(1)?;
        let entry_prices = strings(2)?;
        let exit_prices = strings(3)?;
        let quantities = int64s(4)?;
        let pnls = strings(5)?;
        let entry_times = times(6)?;
        let exit_times = times(7)?;
        let session_ids = strings(8)?;
        let holding = int64s(9)?;
        let seqs = batch
            .column(10)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .ok_or_else(|| anyhow::anyhow!("invalid trade_seq column"))?;
        let since_last = int64s(11)?;
        let reasons = strings(12)?;

        for i in 0..batch.num_rows() {
            let entry_time = DateTime::from_timestamp_micros(entry_times.value(i))
                .ok_or_else(|| anyhow::anyhow!("invalid entry_time"))?;
            let exit_time = DateTime::from_timestamp_micros(exit_times.value(i))
                .ok_or_else(|| anyhow::anyhow!("invalid exit_time"))?;

            trades.push(TradeRecord {
                symbol: symbols.value(i).to_string(),
                direction: Direction::from_str(directions.value(i))?,
                entry_price: Decimal::from_str(entry_prices.value(i))?,
                exit_price: Decimal::from_str(exit_prices.value(i))?,
                quantity: quantities.value(i),
                pnl: Decimal::from_str(pnls.value(i))?,
                entry_time,
                exit_time,
                session_id: uuid::Uuid::from_str(session_ids.value(i))?,
                holding_duration_secs: holding.value(i),
                trade_seq: seqs.value(i),
                time_since_last_trade_secs: since_last.value(i),
                exit_reason: reasons.value(i).to_string(),
            });
        }
    }

    Ok(trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn sample_trade() -> TradeRecord {
        let now = Utc::now();
        TradeRecord {
            symbol: "NIFTY 50".to_string(),
            direction: Direction::Long,
            entry_price: dec!(21500.25),
            exit_price: dec!(21510.75),
            quantity: 10,
            pnl: dec!(105.00),
            entry_time: now,
            exit_time: now,
            session_id: Uuid::new_v4(),
            holding_duration_secs: 42,
            trade_seq: 1,
            time_since_last_trade_secs: 0,
            exit_reason: "MANUAL".to_string(),
        }
    }

    #[test]
    fn test_trade_schema_fields() {
        let schema = trade_schema();
        assert_eq!(schema.fields().len(), 13);
        assert_eq!(schema.field(0).name(), "symbol");
        assert_eq!(schema.field(10).name(), "trade_seq");
    }

    #[test]
    fn test_trade_file_path() {
        let timestamp = DateTime::parse_from_rfc3339("2025-01-04T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let path = trade_file_path(Path::new("/trades"), timestamp);
        assert_eq!(path, PathBuf::from("/trades/trades_20250104_123000.parquet"));
    }

    #[test]
    fn test_write_and_read_trades() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trades.parquet");

        let trade = sample_trade();
        write_trades(&path, std::slice::from_ref(&trade)).unwrap();

        let read_back = read_trades(&path).unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].symbol, trade.symbol);
        assert_eq!(read_back[0].pnl, dec!(105.00));
        assert_eq!(read_back[0].session_id, trade.session_id);
        assert_eq!(read_back[0].trade_seq, 1);
    }

    #[test]
    fn test_write_empty_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trades.parquet");

        write_trades(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_append_never_errors() {
        let temp_dir = TempDir::new().unwrap();
        let store = ParquetTradeStore::new(TradeStoreConfig {
            output_dir: temp_dir.path().to_path_buf(),
            buffer_size: 1,
            flush_interval_secs: 60,
        });

        store.append(sample_trade()).await.unwrap();
    }
}
