//! Instruments command implementation

use crate::catalog::Catalog;
use crate::config::Config;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InstrumentsArgs {}

impl InstrumentsArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dir = config
            .replay
            .data_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let catalog = Catalog::scan(dir)?;

        if catalog.is_empty() {
            println!("No datasets found in {}", dir.display());
            return Ok(());
        }

        for meta in catalog.instruments() {
            println!(
                "{:<16} {} .. {}  ({} rows)",
                meta.instrument, meta.start_date, meta.end_date, meta.rows
            );
        }
        Ok(())
    }
}
