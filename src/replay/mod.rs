//! Historical bar replay
//!
//! Loads a tabular OHLC dataset once and hands out per-session cursors over
//! one day's window, or falls back to a synthetic generator when no dataset
//! is on disk. Replay never terminates on its own: cursors wrap to the
//! start of their window at end of data.

mod parquet;
mod synthetic;

pub use synthetic::SyntheticBars;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// One OHLC interval from the historical dataset.
///
/// The `low <= open,close <= high` invariant is not checked here; malformed
/// rows replay as-is and tick synthesis clamps into the stated envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Replay errors
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Historical dataset missing from disk
    #[error("historical dataset not found: {0}")]
    DataUnavailable(PathBuf),
    /// Requested replay date has no rows
    #[error("no data for date {0}")]
    NoDataForDate(NaiveDate),
    /// Dataset exists but its columns are missing, mistyped, or empty
    #[error("unusable dataset schema: {0}")]
    Schema(String),
    /// Underlying file or parquet failure
    #[error("failed to read dataset: {0}")]
    Read(String),
}

/// A fully loaded dataset, shared read-only across sessions
#[derive(Debug)]
pub struct HistoricalData {
    symbol: String,
    bars: Vec<Bar>,
}

impl HistoricalData {
    /// Load a Parquet OHLC dataset.
    ///
    /// Column names are matched case-insensitively; the time column may be
    /// named `date` or `datetime`. Empty datasets are rejected so every
    /// loaded dataset has an earliest date.
    pub fn load(path: impl AsRef<Path>, symbol: impl Into<String>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReplayError::DataUnavailable(path.to_path_buf()));
        }

        let bars = parquet::read_ohlc_bars(path)?;
        tracing::debug!(path = ?path, rows = bars.len(), "dataset loaded");

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Build a dataset from bars already in memory
    pub fn from_bars(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Earliest calendar date present in the dataset
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.bars.iter().map(|b| b.timestamp.date_naive()).min()
    }

    /// First and last calendar dates present
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.bars.iter().map(|b| b.timestamp.date_naive());
        Some((dates.clone().min()?, dates.max()?))
    }
}

/// Per-session source of bars: a shared historical dataset, or the
/// synthetic fallback used when no dataset is on disk.
#[derive(Clone)]
pub enum ReplaySource {
    Historical(Arc<HistoricalData>),
    Synthetic {
        symbol: String,
        bar_interval_secs: u64,
    },
}

impl ReplaySource {
    pub fn historical(data: Arc<HistoricalData>) -> Self {
        ReplaySource::Historical(data)
    }

    pub fn synthetic(symbol: impl Into<String>, bar_interval_secs: u64) -> Self {
        ReplaySource::Synthetic {
            symbol: symbol.into(),
            bar_interval_secs,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            ReplaySource::Historical(data) => data.symbol(),
            ReplaySource::Synthetic { symbol, .. } => symbol,
        }
    }

    /// Open a cursor over one day's window.
    ///
    /// No date selects the earliest date in the dataset. Rows are filtered
    /// on an exact date-component match; an empty window is
    /// [`ReplayError::NoDataForDate`]. The synthetic source ignores the
    /// date and always succeeds.
    pub fn seek(&self, date: Option<NaiveDate>) -> Result<BarCursor, ReplayError> {
        match self {
            ReplaySource::Historical(data) => {
                let date = match date {
                    Some(d) => d,
                    None => data
                        .earliest_date()
                        .ok_or_else(|| ReplayError::Schema("dataset has no rows".into()))?,
                };

                let indices: Vec<usize> = data
                    .bars()
                    .iter()
                    .enumerate()
                    .filter(|(_, bar)| bar.timestamp.date_naive() == date)
                    .map(|(i, _)| i)
                    .collect();

                if indices.is_empty() {
                    return Err(ReplayError::NoDataForDate(date));
                }

                tracing::debug!(%date, rows = indices.len(), "replay window selected");
                Ok(BarCursor::Window {
                    data: data.clone(),
                    indices,
                    pos: 0,
                })
            }
            ReplaySource::Synthetic {
                bar_interval_secs, ..
            } => Ok(BarCursor::Synthetic(SyntheticBars::new(*bar_interval_secs))),
        }
    }
}

/// Cursor over the selected replay window
#[derive(Debug)]
pub enum BarCursor {
    Window {
        data: Arc<HistoricalData>,
        indices: Vec<usize>,
        pos: usize,
    },
    Synthetic(SyntheticBars),
}

impl BarCursor {
    /// Advance one row, wrapping to the first row at end of window
    pub fn next_bar(&mut self) -> Bar {
        match self {
            BarCursor::Window { data, indices, pos } => {
                let bar = data.bars()[indices[*pos]].clone();
                *pos = (*pos + 1) % indices.len();
                bar
            }
            BarCursor::Synthetic(bars) => bars.next_bar(),
        }
    }

    /// Rows in the current window; synthetic cursors are unbounded
    pub fn window_len(&self) -> Option<usize> {
        match self {
            BarCursor::Window { indices, .. } => Some(indices.len()),
            BarCursor::Synthetic(_) => None,
        }
    }
}
