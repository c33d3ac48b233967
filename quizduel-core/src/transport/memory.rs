use super::Transport;
use crate::error::{QuizduelError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// In-process transport backed by a pair of unbounded channels
pub struct MemoryTransport {
    peer: String,
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryTransport {
    /// Two connected ends, the first labelled `host`, the second `client`
    pub fn pair() -> (Self, Self) {
        let (host_tx, client_rx) = mpsc::unbounded_channel();
        let (client_tx, host_rx) = mpsc::unbounded_channel();

        let host_end = Self {
            peer: "memory:client".to_string(),
            tx: Some(host_tx),
            rx: host_rx,
        };
        let client_end = Self {
            peer: "memory:host".to_string(),
            tx: Some(client_tx),
            rx: client_rx,
        };

        (host_end, client_end)
    }

    pub fn is_open(&self) -> bool {
        self.tx.as_ref().map_or(false, |tx| !tx.is_closed())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: String) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(QuizduelError::ConnectionClosed)?;
        tx.send(frame).map_err(|_| QuizduelError::ConnectionClosed)
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<()> {
        self.tx.take();
        self.rx.close();
        tracing::debug!("Closed memory link to {}", self.peer);
        Ok(())
    }

    fn peer_id(&self) -> &str {
        &self.peer
    }
}
