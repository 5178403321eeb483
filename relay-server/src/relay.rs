//! Fan-out relay implementation
//!
//! # Message flow
//!
//! ```text
//! Connection A ──▶ read_frame ──▶ fanout_tx ──┬──▶ Connection B
//!                                             └──▶ Connection C
//! ```
//!
//! Each connection gets a reader task (publishes inbound frames tagged
//! with the connection id) and a forwarder task (writes every frame
//! whose source id differs from its own). Payloads are opaque bytes.

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use shared::frame::{read_frame, write_frame};

/// Configuration for the relay listener
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen_addr: String,
    /// Capacity of the fan-out broadcast channel
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8081".to_string(),
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The relay: accepts connections and rebroadcasts every inbound frame
/// to every other connection
#[derive(Debug)]
pub struct Relay {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    fanout_tx: broadcast::Sender<(Uuid, Vec<u8>)>,
    clients: Arc<DashMap<Uuid, SocketAddr>>,
    shutdown_token: CancellationToken,
}

impl Relay {
    /// Bind the listener. Port 0 picks an ephemeral port; use
    /// [`Relay::local_addr`] to discover it.
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let listener =
            TcpListener::bind(&config.listen_addr)
                .await
                .map_err(|source| RelayError::Bind {
                    addr: config.listen_addr.clone(),
                    source,
                })?;
        let local_addr = listener.local_addr()?;
        let (fanout_tx, _) = broadcast::channel(config.channel_capacity);

        Ok(Self {
            listener: Mutex::new(Some(listener)),
            local_addr,
            fanout_tx,
            clients: Arc::new(DashMap::new()),
            shutdown_token: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently-open connections
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Cancel the accept loop and every connection task
    pub fn shutdown(&self) {
        tracing::info!("Shutting down relay");
        self.shutdown_token.cancel();
    }

    /// Main accept loop; runs until [`Relay::shutdown`] is called
    pub async fn run(&self) -> Result<(), RelayError> {
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .expect("relay already running");

        tracing::info!("Relay listening on {}", self.local_addr);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Relay accept loop shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::debug!("Client connected: {}", addr);
                            self.spawn_connection_handler(stream, addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn spawn_connection_handler(&self, stream: TcpStream, addr: SocketAddr) {
        let fanout_tx = self.fanout_tx.clone();
        let shutdown_token = self.shutdown_token.clone();
        let clients = self.clients.clone();

        tokio::spawn(async move {
            handle_connection(stream, addr, fanout_tx, shutdown_token, clients).await;
        });
    }
}

/// Handle a single relay connection until it drops
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    fanout_tx: broadcast::Sender<(Uuid, Vec<u8>)>,
    shutdown_token: CancellationToken,
    clients: Arc<DashMap<Uuid, SocketAddr>>,
) {
    let connection_id = Uuid::new_v4();
    clients.insert(connection_id, addr);
    tracing::debug!(%connection_id, %addr, "Connection registered");

    let (mut read_half, write_half) = stream.into_split();

    // Stops the forwarder once the peer goes away
    let disconnect_token = CancellationToken::new();

    let forwarder = spawn_forwarder(
        write_half,
        fanout_tx.subscribe(),
        shutdown_token.clone(),
        disconnect_token.clone(),
        connection_id,
    );

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                break;
            }

            read_result = read_frame(&mut read_half) => {
                match read_result {
                    Ok(Some(payload)) => {
                        // Forward raw bytes; the relay never parses them
                        if fanout_tx.send((connection_id, payload)).is_err() {
                            tracing::debug!(%connection_id, "No peers to forward to");
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(%connection_id, %addr, "Client disconnected");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%connection_id, %addr, "Client read error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    disconnect_token.cancel();
    drop(forwarder);
    clients.remove(&connection_id);
    tracing::debug!(%connection_id, "Connection removed from registry");
}

/// Spawn the task that writes every other connection's frames to this one
fn spawn_forwarder(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut rx: broadcast::Receiver<(Uuid, Vec<u8>)>,
    shutdown_token: CancellationToken,
    disconnect_token: CancellationToken,
    connection_id: Uuid,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    break;
                }
                _ = disconnect_token.cancelled() => {
                    break;
                }
                msg_result = rx.recv() => {
                    match msg_result {
                        Ok((source, payload)) => {
                            // Never echo a frame back to its sender
                            if source == connection_id {
                                continue;
                            }

                            if let Err(e) = write_frame(&mut write_half, &payload).await {
                                tracing::debug!(%connection_id, "Client write failed: {}", e);
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            // No backfill protocol: the dropped frames are
                            // simply lost for this client
                            tracing::warn!(
                                %connection_id,
                                dropped_messages = n,
                                "Client lagged behind, frames dropped"
                            );
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!(%connection_id, "Forwarder stopped");
    })
}
