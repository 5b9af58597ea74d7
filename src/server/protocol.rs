//! Wire protocol for the streaming session
//!
//! Inbound commands and outbound messages are closed tagged unions.
//! Unknown JSON fields are ignored; missing optional fields take their
//! stated defaults; anything unparsable is a [`ProtocolError`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inbound client command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "UPPERCASE")]
pub enum ClientCommand {
    /// Begin (or re-begin) replay from a date at a speed multiplier
    Start {
        #[serde(default)]
        date: Option<NaiveDate>,
        #[serde(default)]
        speed: Option<f64>,
    },
    /// Pause emission, abandoning the current bar's remaining batches
    Stop,
    /// Open a long at the last streamed price
    Buy {
        #[serde(default = "default_quantity")]
        quantity: i64,
    },
    /// Close a long (or open a short) at the last streamed price
    Sell {
        #[serde(default = "default_quantity")]
        quantity: i64,
    },
}

fn default_quantity() -> i64 {
    1
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Unparsable or mistagged inbound message
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientCommand {
    /// Parse one inbound text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// One tick as sent to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickPayload {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub pnl: Decimal,
}

/// Outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "UPPERCASE")]
pub enum ServerMessage {
    /// Ordered batch of ticks
    Batch(Vec<TickPayload>),
    /// Human-readable failure note
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
