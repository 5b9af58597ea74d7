//! Intra-bar tick synthesis
//!
//! Expands one OHLC bar into a plausible sequence of tick prices

mod bridge;

pub use bridge::TickSynthesizer;
