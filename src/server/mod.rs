//! WebSocket replay server
//!
//! Accepts connections and spawns one session task per client. Sessions
//! share nothing but the read-only dataset and the append-only trade store.

pub mod protocol;
mod session;

pub use session::SessionController;

use crate::config::SessionConfig;
use crate::replay::ReplaySource;
use crate::store::TradeStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

/// Accepts WebSocket clients and streams replay sessions to them
pub struct ReplayServer {
    listener: TcpListener,
    source: ReplaySource,
    store: Arc<dyn TradeStore>,
    session_config: SessionConfig,
}

impl ReplayServer {
    /// Bind the listener; serving starts with [`run`](Self::run)
    pub async fn bind(
        addr: &str,
        source: ReplaySource,
        store: Arc<dyn TradeStore>,
        session_config: SessionConfig,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            source,
            store,
            session_config,
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop; runs until the process stops
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(addr = %self.local_addr()?, "replay server listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let source = self.source.clone();
            let store = self.store.clone();
            let config = self.session_config.clone();

            tokio::spawn(async move {
                let ws = match accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(e) => {
                        tracing::warn!(%peer, error = %e, "websocket handshake failed");
                        return;
                    }
                };

                let session = SessionController::new(source, store, config);
                // Per-cycle failures end this session only, never the server
                if let Err(e) = session.run(ws).await {
                    tracing::error!(%peer, error = %e, "session ended with error");
                }
            });
        }
    }
}
