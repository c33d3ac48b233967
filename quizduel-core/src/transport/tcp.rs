use super::Transport;
use crate::error::{QuizduelError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

/// Newline-delimited frames over a TCP stream
pub struct TcpTransport {
    peer: String,
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TcpTransport {
    /// Client side: dial the host at `peer_addr` (`host:port`)
    pub async fn connect(peer_addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(peer_addr).await.map_err(|e| {
            QuizduelError::transport(format!("Failed to connect to {}: {}", peer_addr, e))
        })?;

        tracing::info!("Connected to host at {}", peer_addr);
        Self::from_stream(stream, peer_addr.to_string())
    }

    /// Host side: wait for the one client this match will have
    pub async fn accept(listener: &TcpListener) -> Result<Self> {
        let (stream, addr) = listener
            .accept()
            .await
            .map_err(|e| QuizduelError::transport(format!("Failed to accept peer: {}", e)))?;

        tracing::info!("Accepted connection from {}", addr);
        Self::from_stream(stream, addr.to_string())
    }

    fn from_stream(stream: TcpStream, peer: String) -> Result<Self> {
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            peer,
            reader: BufReader::new(read_half).lines(),
            writer: write_half,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: String) -> Result<()> {
        if frame.contains('\n') {
            return Err(QuizduelError::transport("Frame must not contain a newline"));
        }

        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.reader.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        tracing::debug!("Closed TCP link to {}", self.peer);
        Ok(())
    }

    fn peer_id(&self) -> &str {
        &self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let dial = tokio::spawn(async move { TcpTransport::connect(&addr).await.unwrap() });
        let mut host = TcpTransport::accept(&listener).await.unwrap();
        let mut client = dial.await.unwrap();

        client.send(r#"{"type":"HELLO"}"#.to_string()).await.unwrap();
        assert_eq!(host.recv().await.unwrap().unwrap(), r#"{"type":"HELLO"}"#);

        assert!(host.send("a\nb".to_string()).await.is_err());

        client.close().await.unwrap();
        assert!(host.recv().await.is_none());
    }
}
