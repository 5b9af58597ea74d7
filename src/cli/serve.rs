//! Serve command implementation

use crate::config::Config;
use crate::replay::{HistoricalData, ReplaySource};
use crate::server::ReplayServer;
use crate::store::{MemoryTradeStore, ParquetTradeStore, TradeStore, TradeStoreConfig};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the bind address from the config file
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let source = match HistoricalData::load(&config.replay.data_path, &config.replay.symbol) {
            Ok(data) => {
                tracing::info!(
                    path = ?config.replay.data_path,
                    rows = data.len(),
                    "historical dataset loaded"
                );
                ReplaySource::historical(Arc::new(data))
            }
            Err(e) => {
                tracing::warn!(error = %e, "dataset unavailable, streaming synthetic bars");
                ReplaySource::synthetic(&config.replay.symbol, config.replay.bar_interval_secs)
            }
        };

        let store: Arc<dyn TradeStore> = if config.store.enabled {
            Arc::new(ParquetTradeStore::new(TradeStoreConfig {
                output_dir: config.store.output_dir.clone(),
                buffer_size: config.store.buffer_size,
                flush_interval_secs: config.store.flush_interval_secs,
            }))
        } else {
            Arc::new(MemoryTradeStore::new())
        };

        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        let server = ReplayServer::bind(bind, source, store, config.session.clone()).await?;
        server.run().await
    }
}
