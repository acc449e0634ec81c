//! Duplex transport contract.
//!
//! The signal client drives any byte/text channel through
//! [`DuplexTransport`] and is told about activity through a
//! [`TransportObserver`]. Framing, TLS and socket-level reconnects are the
//! transport's business.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

// ============================================================================
// Types
// ============================================================================

/// Extra HTTP headers sent with the opening handshake.
pub type Headers = [(String, String)];

// ============================================================================
// DuplexTransport
// ============================================================================

/// A message-oriented, bidirectional channel to the signaling server.
///
/// Implementations must be callable from any thread and must never call the
/// observer synchronously from inside [`open`](Self::open),
/// [`send`](Self::send) or [`close`](Self::close).
pub trait DuplexTransport: Send + Sync {
    /// Starts opening a connection to `url`.
    ///
    /// Returns `false` if the attempt could not be started at all. The
    /// outcome of a started attempt arrives through `observer`.
    fn open(&self, url: &Url, headers: &Headers, observer: Arc<dyn TransportObserver>) -> bool;

    /// Queues a binary frame; returns `false` if the transport rejected it.
    fn send(&self, data: Bytes) -> bool;

    /// Closes the connection. Idempotent.
    fn close(&self);
}

// ============================================================================
// TransportObserver
// ============================================================================

/// Receives transport activity.
pub trait TransportObserver: Send + Sync {
    /// The connection is open.
    fn on_open(&self);

    /// A binary frame arrived.
    fn on_binary_message(&self, data: Bytes);

    /// A text frame arrived.
    fn on_text_message(&self, text: String);

    /// The peer closed the connection.
    fn on_close(&self, code: u16, reason: String);

    /// The connection failed.
    fn on_error(&self, message: String);
}
