//! Per-connection session controller
//!
//! Owns one replay cursor, one position ledger, and one synthesizer, and
//! interleaves a bounded command poll with paced batch emission. The cycle
//! runs once per batch, so commands are applied strictly between batches
//! and never mid-batch.

use super::protocol::{ClientCommand, ServerMessage, TickPayload};
use crate::config::SessionConfig;
use crate::ledger::PositionLedger;
use crate::replay::{BarCursor, ReplaySource};
use crate::store::TradeStore;
use crate::synth::TickSynthesizer;
use crate::telemetry;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use uuid::Uuid;

type PricedTick = (Decimal, DateTime<Utc>);

/// Drives one client connection until it disconnects
pub struct SessionController {
    id: Uuid,
    source: ReplaySource,
    cursor: Option<BarCursor>,
    ledger: PositionLedger,
    synth: TickSynthesizer,
    store: Arc<dyn TradeStore>,
    config: SessionConfig,
    running: bool,
    speed: f64,
    last_price: Decimal,
    pending: VecDeque<Vec<PricedTick>>,
}

impl SessionController {
    pub fn new(source: ReplaySource, store: Arc<dyn TradeStore>, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        let ledger = PositionLedger::new(source.symbol(), id);

        Self {
            id,
            source,
            cursor: None,
            ledger,
            synth: TickSynthesizer::new(),
            store,
            config,
            running: false,
            speed: 1.0,
            last_price: Decimal::ZERO,
            pending: VecDeque::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run against an accepted WebSocket until the client disconnects.
    ///
    /// Transport errors end the session; they are not retried. Open
    /// positions are dropped, not persisted.
    pub async fn run(mut self, ws: WebSocketStream<TcpStream>) -> anyhow::Result<()> {
        let (mut sink, mut stream) = ws.split();

        tracing::info!(session = %self.id, symbol = self.source.symbol(), "client connected");
        telemetry::session_opened();

        let result = self.run_loop(&mut sink, &mut stream).await;

        telemetry::session_closed();
        tracing::info!(session = %self.id, trades = self.ledger.trade_count(), "client disconnected");

        result
    }

    async fn run_loop<Si, St>(&mut self, sink: &mut Si, stream: &mut St) -> anyhow::Result<()>
    where
        Si: Sink<Message> + Unpin,
        Si::Error: std::error::Error + Send + Sync + 'static,
        St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            // Bounded poll keeps commands responsive without stalling emission
            match timeout(self.config.poll_timeout(), stream.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => {
                    if let Some(reply) = self.apply_text(&text).await {
                        sink.send(Message::Text(serde_json::to_string(&reply)?))
                            .await?;
                    }
                }
                Ok(Some(Ok(Message::Ping(data)))) => {
                    sink.send(Message::Pong(data)).await?;
                }
                Ok(Some(Ok(Message::Close(_)))) | Ok(None) => return Ok(()),
                Ok(Some(Ok(_))) => {} // binary and pong frames are ignored
                Ok(Some(Err(e))) => {
                    tracing::warn!(session = %self.id, error = %e, "transport error");
                    return Ok(());
                }
                Err(_) => {} // poll window elapsed without a command
            }

            if !self.running {
                sleep(self.config.idle_wait()).await;
                continue;
            }

            if let Some(batch) = self.next_batch() {
                let message = ServerMessage::Batch(batch);
                sink.send(Message::Text(serde_json::to_string(&message)?))
                    .await?;
                telemetry::batch_emitted();

                sleep(self.batch_delay()).await;
            }
        }
    }

    /// Parse and apply one text frame; malformed input becomes an ERROR
    async fn apply_text(&mut self, text: &str) -> Option<ServerMessage> {
        match ClientCommand::parse(text) {
            Ok(cmd) => self.apply_command(cmd).await,
            Err(e) => {
                tracing::debug!(session = %self.id, error = %e, "ignoring malformed command");
                Some(ServerMessage::error(e.to_string()))
            }
        }
    }

    /// Apply one parsed command; returns a message to send back, if any
    async fn apply_command(&mut self, cmd: ClientCommand) -> Option<ServerMessage> {
        match cmd {
            ClientCommand::Start { date, speed } => match self.source.seek(date) {
                Ok(cursor) => {
                    self.speed = speed.unwrap_or(1.0);
                    self.cursor = Some(cursor);
                    self.pending.clear();
                    self.running = true;
                    tracing::info!(session = %self.id, ?date, speed = self.speed, "replay started");
                    None
                }
                Err(e) => {
                    tracing::warn!(session = %self.id, error = %e, "seek failed");
                    Some(ServerMessage::error(e.to_string()))
                }
            },
            ClientCommand::Stop => {
                self.running = false;
                self.pending.clear();
                tracing::info!(session = %self.id, "replay stopped");
                None
            }
            ClientCommand::Buy { quantity } => {
                self.ledger.open(self.last_price, quantity);
                None
            }
            ClientCommand::Sell { quantity } => {
                let outcome = self.ledger.close(self.last_price, quantity);
                if let Some(record) = outcome.record {
                    telemetry::trade_logged();
                    if let Err(e) = self.store.append(record).await {
                        tracing::warn!(session = %self.id, error = %e, "trade append failed");
                    }
                }
                None
            }
        }
    }

    /// Next batch payload, pulling a fresh bar when the queue is drained.
    ///
    /// PnL is marked per tick at emission time so trades placed between
    /// batches are reflected in the very next batch.
    fn next_batch(&mut self) -> Option<Vec<TickPayload>> {
        if self.pending.is_empty() {
            self.refill_from_next_bar();
        }
        let chunk = self.pending.pop_front()?;

        let symbol = self.source.symbol().to_string();
        let mut batch = Vec::with_capacity(chunk.len());
        for (price, timestamp) in chunk {
            self.last_price = price;
            let pnl = self.ledger.mark_to_market(price);
            batch.push(TickPayload {
                price,
                timestamp,
                symbol: symbol.clone(),
                pnl,
            });
        }
        Some(batch)
    }

    fn refill_from_next_bar(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        let bar = cursor.next_bar();

        let ticks =
            self.synth
                .generate(bar.open, bar.high, bar.low, bar.close, self.config.ticks_per_bar);

        let stamped: Vec<PricedTick> = ticks
            .into_iter()
            .enumerate()
            .map(|(i, price)| (price, bar.timestamp + ChronoDuration::seconds(i as i64)))
            .collect();

        for chunk in stamped.chunks(self.config.batch_size.max(1)) {
            self.pending.push_back(chunk.to_vec());
        }
    }

    /// Inter-batch delay: base interval scaled by the floored speed
    fn batch_delay(&self) -> Duration {
        let speed = self.speed.max(self.config.min_speed);
        Duration::from_secs_f64(self.config.base_interval_ms as f64 / 1000.0 / speed)
    }
}
