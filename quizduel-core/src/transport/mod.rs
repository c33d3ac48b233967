//! Point-to-point link between the two peers.
//!
//! The game only needs an ordered duplex channel of text frames; how the two
//! peers find each other is up to the adapter.

pub mod memory;
pub mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

use crate::error::Result;
use async_trait::async_trait;

/// Ordered duplex channel of text frames between exactly two peers
///
/// A transport is open once constructed. `recv` yields `None` when the other
/// side is gone; after that the link is considered closed for good.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Queue one frame for the peer. Frames arrive in send order.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Next frame from the peer, `None` once the link has closed.
    ///
    /// Must be cancel safe: it is polled inside `tokio::select!`.
    async fn recv(&mut self) -> Option<Result<String>>;

    async fn close(&mut self) -> Result<()>;

    /// Opaque identifier of the remote end, for logging
    fn peer_id(&self) -> &str;
}
