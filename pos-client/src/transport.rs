//! Transport abstraction for the sync channel
//!
//! [`TcpTransport`] speaks the relay's length-prefixed JSON framing;
//! [`MemoryTransport`] pairs two broadcast channels for in-process
//! tests without a socket.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};

use crate::error::ChannelError;
use shared::event::SyncEvent;
use shared::frame::{read_frame, write_frame};

/// Transport abstraction for relay communication
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_event(&self) -> Result<SyncEvent, ChannelError>;
    async fn write_event(&self, event: &SyncEvent) -> Result<(), ChannelError>;
    async fn close(&self) -> Result<(), ChannelError>;
}

/// TCP Transport Implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_event(&self) -> Result<SyncEvent, ChannelError> {
        let mut reader = self.reader.lock().await;
        match read_frame(&mut *reader).await? {
            Some(payload) => Ok(SyncEvent::from_bytes(&payload)?),
            None => Err(ChannelError::Closed),
        }
    }

    async fn write_event(&self, event: &SyncEvent) -> Result<(), ChannelError> {
        let payload = event.to_bytes()?;
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &payload).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ChannelError> {
        // Dropping the halves closes the stream
        Ok(())
    }
}

/// Memory Transport Implementation (for in-process tests)
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Receiver for events arriving from the simulated relay
    rx: Arc<Mutex<broadcast::Receiver<SyncEvent>>>,
    /// Sender for events going out to the simulated relay
    tx: broadcast::Sender<SyncEvent>,
}

impl MemoryTransport {
    pub fn new(
        inbound_tx: &broadcast::Sender<SyncEvent>,
        outbound_tx: &broadcast::Sender<SyncEvent>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(inbound_tx.subscribe())),
            tx: outbound_tx.clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_event(&self) -> Result<SyncEvent, ChannelError> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|_| ChannelError::Closed)
    }

    async fn write_event(&self, event: &SyncEvent) -> Result<(), ChannelError> {
        self.tx
            .send(event.clone())
            .map_err(|e| ChannelError::Connection(format!("Memory channel error: {}", e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
