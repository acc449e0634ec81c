//! RTC Signal Client - Signaling for multi-party real-time media rooms.
//!
//! This library connects to a room server's signaling endpoint, exchanges
//! the binary request/response protocol and keeps the session alive with
//! ping/pong probing. Media capture and peer connections live elsewhere; they
//! consume this crate through listener traits and typed request methods.
//!
//! # Architecture
//!
//! The client follows a queue-per-session model:
//!
//! - **Outbound**: typed `send_*` methods encode an [`OutboundRequest`] and
//!   write it to the [`DuplexTransport`]
//! - **Inbound**: frames are decoded into a [`SignalMessage`] and routed to
//!   exactly one [`SignalServerListener`] method
//!
//! Key design principles:
//!
//! - Each [`SignalClient`] owns: transport + state machine + task queue + timers
//! - All callbacks for one client run serially on its [`TaskQueue`]
//! - Posted tasks hold weak references only
//! - Failures are reported through listeners, never by panicking
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rtc_signal_client::{
//!     ConnectionState, Result, SignalClient, SignalClientId, SignalTransportListener,
//! };
//!
//! struct Log;
//!
//! impl SignalTransportListener for Log {
//!     fn on_transport_state_changed(&self, id: SignalClientId, state: ConnectionState) {
//!         println!("client {id}: {state}");
//!     }
//!
//!     fn on_transport_error(&self, id: SignalClientId, message: &str) {
//!         eprintln!("client {id}: {message}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = SignalClient::builder()
//!         .url("wss://rooms.example.com")
//!         .token("eyJhbGciOi...")
//!         .build()?;
//!
//!     client.add_transport_listener(Arc::new(Log));
//!     client.connect();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`SignalClient`], listeners, sender, receiver, ping/pong |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Message types and wire codec |
//! | [`runtime`] | Serial task queue and timers |
//! | [`transport`] | Connection state machine and WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Signal client and its collaborators.
///
/// Use [`SignalClient::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// Fallible construction returns [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Signaling protocol message types.
///
/// Payload structs, request/response envelopes and the protobuf wire codec.
pub mod protocol;

/// Serial task queue on tokio.
pub mod runtime;

/// Transport layer.
///
/// Connection states, the duplex transport contract and its WebSocket
/// implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    PingPongKit, PingPongKitListener, RequestSender, ResponseReceiver, SignalClient,
    SignalClientBuilder, SignalOptions, SignalServerListener, SignalTransportListener,
};

// Error types
pub use error::{DecodeError, Error, Result};

// Identifier types
pub use identifiers::{ListenerId, SignalClientId};

// Protocol types
pub use protocol::{OutboundRequest, SignalMessage};

// Runtime types
pub use runtime::{DelayedTask, TaskQueue};

// Transport types
pub use transport::{
    ConnectionState, DuplexTransport, TransportObserver, TransportStateMachine,
    WebSocketTransport,
};
