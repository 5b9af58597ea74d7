//! Instrument metadata lookup
//!
//! Scans the data directory for Parquet datasets and serves date-range and
//! row-count metadata by instrument name. Unknown names are the lookup
//! equivalent of a 404.

use crate::replay::HistoricalData;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No dataset registered under this name
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),
}

/// Metadata for one dataset
#[derive(Debug, Clone)]
pub struct InstrumentMeta {
    pub instrument: String,
    pub path: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: usize,
}

/// Instrument-name keyed view over the data directory
#[derive(Default)]
pub struct Catalog {
    entries: HashMap<String, InstrumentMeta>,
}

impl Catalog {
    /// Scan a directory for `*.parquet` datasets.
    ///
    /// The instrument name is the uppercased file stem. Unreadable files
    /// are skipped with a warning rather than failing the whole scan; a
    /// missing directory yields an empty catalog.
    pub fn scan(dir: &Path) -> anyhow::Result<Self> {
        let mut entries = HashMap::new();

        if !dir.is_dir() {
            return Ok(Self { entries });
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let instrument = stem.to_uppercase();

            match HistoricalData::load(&path, instrument.clone()) {
                Ok(data) => {
                    if let Some((start_date, end_date)) = data.date_range() {
                        entries.insert(
                            instrument.clone(),
                            InstrumentMeta {
                                instrument,
                                path: path.clone(),
                                start_date,
                                end_date,
                                rows: data.len(),
                            },
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "skipping unreadable dataset");
                }
            }
        }

        Ok(Self { entries })
    }

    /// Look up one instrument by name (case-insensitive)
    pub fn get(&self, instrument: &str) -> Result<&InstrumentMeta, CatalogError> {
        self.entries
            .get(&instrument.to_uppercase())
            .ok_or_else(|| CatalogError::UnknownInstrument(instrument.to_string()))
    }

    /// All instruments, sorted by name
    pub fn instruments(&self) -> Vec<&InstrumentMeta> {
        let mut all: Vec<&InstrumentMeta> = self.entries.values().collect();
        all.sort_by(|a, b| a.instrument.cmp(&b.instrument));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
