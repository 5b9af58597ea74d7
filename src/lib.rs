//! tickshift: market replay and position simulation engine
//!
//! This library provides the core components for:
//! - Historical bar replay from Parquet with a synthetic fallback
//! - Intra-bar tick synthesis via a scaled Brownian bridge
//! - A per-session position ledger with realized/unrealized PnL
//! - A WebSocket session controller streaming paced tick batches
//! - A durable Parquet trade log
//! - Instrument metadata lookup
//! - Full observability stack

pub mod catalog;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod replay;
pub mod server;
pub mod store;
pub mod synth;
pub mod telemetry;
