//! Parquet OHLC reading

use super::{Bar, ReplayError};
use arrow::array::{
    Array, Date32Array, Float64Array, StringArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;

/// Read every row of an OHLC dataset.
///
/// Column names are matched case-insensitively. Prices must be Float64;
/// the `date`/`datetime` column may be a timestamp of any unit, a Date32,
/// or a string in common datetime formats.
pub(super) fn read_ohlc_bars(path: &Path) -> Result<Vec<Bar>, ReplayError> {
    let file = File::open(path).map_err(|e| ReplayError::Read(e.to_string()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| ReplayError::Read(e.to_string()))?;
    let schema = builder.schema().clone();

    let column = |name: &str| {
        schema
            .fields()
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(name))
    };

    let open_idx = column("open").ok_or_else(|| missing_column("open"))?;
    let high_idx = column("high").ok_or_else(|| missing_column("high"))?;
    let low_idx = column("low").ok_or_else(|| missing_column("low"))?;
    let close_idx = column("close").ok_or_else(|| missing_column("close"))?;
    let time_idx = column("date")
        .or_else(|| column("datetime"))
        .ok_or_else(|| missing_column("date/datetime"))?;

    let reader = builder.build().map_err(|e| ReplayError::Read(e.to_string()))?;

    let mut bars = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| ReplayError::Read(e.to_string()))?;

        let open = price_column(&batch, open_idx, "open")?;
        let high = price_column(&batch, high_idx, "high")?;
        let low = price_column(&batch, low_idx, "low")?;
        let close = price_column(&batch, close_idx, "close")?;
        let timestamps = timestamp_column(&batch, time_idx)?;

        for i in 0..batch.num_rows() {
            bars.push(Bar {
                open: to_price(open.value(i)),
                high: to_price(high.value(i)),
                low: to_price(low.value(i)),
                close: to_price(close.value(i)),
                timestamp: timestamps[i],
            });
        }
    }

    if bars.is_empty() {
        return Err(ReplayError::Schema("dataset has no rows".into()));
    }

    Ok(bars)
}

fn missing_column(name: &str) -> ReplayError {
    ReplayError::Schema(format!("missing column: {}", name))
}

fn to_price(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn price_column<'a>(
    batch: &'a RecordBatch,
    idx: usize,
    name: &str,
) -> Result<&'a Float64Array, ReplayError> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ReplayError::Schema(format!("column {} is not Float64", name)))
}

fn timestamp_column(batch: &RecordBatch, idx: usize) -> Result<Vec<DateTime<Utc>>, ReplayError> {
    let col = batch.column(idx);

    let parsed: Option<Vec<DateTime<Utc>>> = match col.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            let arr = downcast::<TimestampSecondArray>(col)?;
            (0..arr.len())
                .map(|i| DateTime::from_timestamp(arr.value(i), 0))
                .collect()
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let arr = downcast::<TimestampMillisecondArray>(col)?;
            (0..arr.len())
                .map(|i| DateTime::from_timestamp_millis(arr.value(i)))
                .collect()
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let arr = downcast::<TimestampMicrosecondArray>(col)?;
            (0..arr.len())
                .map(|i| DateTime::from_timestamp_micros(arr.value(i)))
                .collect()
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let arr = downcast::<TimestampNanosecondArray>(col)?;
            Some(
                (0..arr.len())
                    .map(|i| DateTime::from_timestamp_nanos(arr.value(i)))
                    .collect(),
            )
        }
        DataType::Date32 => {
            let arr = downcast::<Date32Array>(col)?;
            (0..arr.len())
                .map(|i| DateTime::from_timestamp(i64::from(arr.value(i)) * 86_400, 0))
                .collect()
        }
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(col)?;
            (0..arr.len()).map(|i| parse_datetime(arr.value(i))).collect()
        }
        other => {
            return Err(ReplayError::Schema(format!(
                "unsupported time column type: {}",
                other
            )))
        }
    };

    parsed.ok_or_else(|| ReplayError::Schema("unparsable timestamp value".into()))
}

fn downcast<T: 'static>(col: &dyn Array) -> Result<&T, ReplayError> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ReplayError::Schema("time column type mismatch".into()))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
