//! Reconnecting sync channel
//!
//! Maintains a single logical connection to the relay: inbound frames
//! are parsed and published to the [`EventBus`]; outbound events are
//! serialized and written by a background task. On connection loss the
//! channel retries with a fixed delay up to a bounded number of
//! attempts, then gives up silently. There is no outbound queue:
//! events sent while disconnected are dropped with a warning.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::error::ChannelError;
use crate::store::EventSink;
use crate::transport::{TcpTransport, Transport};
use shared::event::SyncEvent;

/// Channel configuration
///
/// The retry policy is deliberately simple: a fixed delay and a hard
/// attempt cap, no backoff growth.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Relay address, host-derived by the caller
    pub addr: String,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Consecutive failed attempts before giving up
    pub max_reconnect_attempts: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8081".to_string(),
            reconnect_delay: Duration::from_millis(3000),
            max_reconnect_attempts: 5,
        }
    }
}

#[derive(Debug)]
struct ChannelInner {
    config: ChannelConfig,
    bus: Arc<EventBus>,
    /// `Some` while connected; the sender feeds the writer task
    outbound: Mutex<Option<mpsc::UnboundedSender<SyncEvent>>>,
    /// Consecutive failed connection attempts, reset on success
    reconnect_attempts: AtomicU32,
    shutdown_token: CancellationToken,
}

/// The reconnecting transport channel
#[derive(Debug, Clone)]
pub struct SyncChannel {
    inner: Arc<ChannelInner>,
}

impl SyncChannel {
    pub fn new(config: ChannelConfig, bus: Arc<EventBus>) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                config,
                bus,
                outbound: Mutex::new(None),
                reconnect_attempts: AtomicU32::new(0),
                shutdown_token: CancellationToken::new(),
            }),
        }
    }

    /// Open the connection; idempotent. Failure is non-fatal and only
    /// schedules a reconnect attempt.
    pub async fn connect(&self) {
        ChannelInner::connect(self.inner.clone()).await;
    }

    /// Send an event, fire-and-forget. Dropped with a warning when the
    /// channel is not currently open.
    pub fn send(&self, event: &SyncEvent) {
        let guard = self.inner.outbound.lock().unwrap();
        let delivered = match guard.as_ref() {
            Some(tx) => tx.send(event.clone()).is_ok(),
            None => false,
        };
        if !delivered {
            tracing::warn!(kind = %event.kind(), "Channel not connected, message not sent");
        }
    }

    /// Passive connection indicator
    pub fn is_connected(&self) -> bool {
        self.inner.outbound.lock().unwrap().is_some()
    }

    /// Consecutive failed connection attempts since the last success
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Teardown: close the connection, stop reconnecting, and drop
    /// every bus subscription
    pub fn disconnect(&self) {
        self.inner.shutdown_token.cancel();
        self.inner.outbound.lock().unwrap().take();
        self.inner.bus.clear();
    }
}

impl EventSink for SyncChannel {
    fn send(&self, event: &SyncEvent) {
        SyncChannel::send(self, event);
    }
}

impl ChannelInner {
    fn is_connected(&self) -> bool {
        self.outbound.lock().unwrap().is_some()
    }

    async fn connect(inner: Arc<Self>) {
        if inner.shutdown_token.is_cancelled() {
            return;
        }
        if inner.is_connected() {
            tracing::debug!("Channel already connected");
            return;
        }

        tracing::info!("🔌 Connecting to relay: {}", inner.config.addr);
        match TcpTransport::connect(&inner.config.addr).await {
            Ok(transport) => {
                inner.reconnect_attempts.store(0, Ordering::SeqCst);
                let (tx, rx) = mpsc::unbounded_channel();
                *inner.outbound.lock().unwrap() = Some(tx);
                tracing::info!("Channel connected");
                Self::spawn_io(inner, transport, rx);
            }
            Err(e) => {
                tracing::error!("Failed to connect: {}", e);
                Self::schedule_reconnect(inner);
            }
        }
    }

    /// Spawn the reader and writer tasks for one connection
    fn spawn_io(
        inner: Arc<Self>,
        transport: TcpTransport,
        mut outbound_rx: mpsc::UnboundedReceiver<SyncEvent>,
    ) {
        // Cancelled by whichever side detects the loss first
        let conn_token = CancellationToken::new();

        let writer = transport.clone();
        let writer_inner = inner.clone();
        let writer_token = conn_token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_token.cancelled() => break,
                    maybe = outbound_rx.recv() => {
                        match maybe {
                            Some(event) => {
                                if let Err(e) = writer.write_event(&event).await {
                                    tracing::warn!("Channel write failed: {}", e);
                                    writer_inner.on_connection_lost(&writer_token);
                                    break;
                                }
                            }
                            // Sender dropped on teardown
                            None => break,
                        }
                    }
                }
            }
        });

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = inner.shutdown_token.cancelled() => {
                        let _ = transport.close().await;
                        break;
                    }
                    _ = conn_token.cancelled() => break,
                    result = transport.read_event() => {
                        match result {
                            Ok(event) => inner.bus.publish(&event),
                            Err(ChannelError::InvalidFrame(e)) => {
                                // Malformed frames never crash the channel
                                tracing::error!("Error parsing inbound frame, dropped: {}", e);
                            }
                            Err(e) => {
                                tracing::info!("Channel disconnected: {}", e);
                                inner.on_connection_lost(&conn_token);
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    /// Tear down one connection's tasks and schedule a reconnect.
    /// Only the first caller per connection wins, so a simultaneous
    /// read and write failure schedules a single retry.
    fn on_connection_lost(self: &Arc<Self>, conn_token: &CancellationToken) {
        conn_token.cancel();
        let was_connected = self.outbound.lock().unwrap().take().is_some();
        if was_connected && !self.shutdown_token.is_cancelled() {
            Self::schedule_reconnect(self.clone());
        }
    }

    fn schedule_reconnect(inner: Arc<Self>) {
        let attempt = inner.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let max = inner.config.max_reconnect_attempts;
        if attempt > max {
            // Bounded retries with silent give-up; the connection
            // indicator is the only surface of this state
            tracing::debug!("Reconnect attempts exhausted ({} max)", max);
            return;
        }

        let delay = inner.config.reconnect_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.shutdown_token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            tracing::info!("Attempting to reconnect... ({}/{})", attempt, max);
            Self::connect(inner).await;
        });
    }
}
