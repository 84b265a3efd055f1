//! The producer's write-side transport seam.
//!
//! Messages travel as an ordered binary stream — WebSocket binary frames
//! are the canonical carrier — but transport reliability itself is out of
//! scope here. `AsyncTransport` is the minimal shape that lets
//! [`crate::producer::RemoteCanvas::flush`] stay agnostic to what actually
//! carries the bytes; [`ChannelTransport`] is the in-process implementation
//! used by this crate's own tests and by application code wiring a
//! producer directly to a decoder task without a real socket in between.

use crate::errors::{CanvasError, Result};

/// Write side of the transport a [`crate::producer::RemoteCanvas`] flushes
/// messages over.
///
/// `send` takes an owned `Vec<u8>` rather than a borrowed slice so
/// implementations backed by an async channel can move the buffer in
/// without an extra copy.
pub trait AsyncTransport: Send {
    /// Sends one complete protocol message. Must not split or coalesce
    /// messages — each call corresponds to exactly one `Flush`.
    fn send(&mut self, message: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Whether the transport has already been closed. `Flush` checks this
    /// before encoding anything and returns without writing if true,
    /// matching "if the transport is closed, returns without writing."
    fn is_closed(&self) -> bool;
}

/// An in-process [`AsyncTransport`] backed by a [`tokio::sync::mpsc`]
/// channel, for wiring a producer directly to a decoder task in tests or
/// single-process embeddings.
pub struct ChannelTransport {
    sender: tokio::sync::mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    #[must_use]
    pub fn new(sender: tokio::sync::mpsc::Sender<Vec<u8>>) -> Self {
        Self { sender }
    }

    /// Builds a connected transport/receiver pair with the given channel
    /// capacity (in messages, not bytes).
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, tokio::sync::mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl AsyncTransport for ChannelTransport {
    async fn send(&mut self, message: Vec<u8>) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.sender
            .send(message)
            .await
            .map_err(|_| CanvasError::TransportClosed)
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::{AsyncTransport, ChannelTransport};

    #[tokio::test]
    async fn send_delivers_bytes_to_the_receiver() {
        let (mut transport, mut rx) = ChannelTransport::channel(4);
        transport.send(vec![1, 2, 3]).await.unwrap();
        assert_eq!(rx.recv().await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn send_on_closed_transport_returns_without_writing() {
        let (mut transport, rx) = ChannelTransport::channel(4);
        drop(rx);
        assert!(transport.is_closed());
        assert!(transport.send(vec![9]).await.is_ok());
    }
}
