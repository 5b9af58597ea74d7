//! Prometheus metrics

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Install the Prometheus exporter on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}

/// A client connected
pub fn session_opened() {
    counter!("tickshift_sessions_total").increment(1);
    gauge!("tickshift_active_sessions").increment(1.0);
}

/// A client disconnected
pub fn session_closed() {
    gauge!("tickshift_active_sessions").decrement(1.0);
}

/// One tick batch went out
pub fn batch_emitted() {
    counter!("tickshift_batches_emitted_total").increment(1);
}

/// One closed trade was handed to the store
pub fn trade_logged() {
    counter!("tickshift_trades_logged_total").increment(1);
}
