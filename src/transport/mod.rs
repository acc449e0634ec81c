//! Transport layer.
//!
//! This module owns the connection state machine and the duplex channel the
//! signal client speaks through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  SignalClient   │                              │  Signaling      │
//! │                 │      DuplexTransport         │  Server         │
//! │  StateMachine   │◄────────────────────────────►│                 │
//! │  → Observer     │    (WebSocket by default)    │  /rtc endpoint  │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `TransportStateMachine` moves to `Connecting`
//! 2. `DuplexTransport::open` starts the handshake
//! 3. `TransportObserver::on_open` moves the client to `Connected`
//! 4. Frames flow through `send` and the observer callbacks
//! 5. `close`, a remote close or an error ends in `Disconnected`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | Connection states and the transition table |
//! | `duplex` | Transport and observer traits |
//! | `websocket` | tokio-tungstenite transport and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// Connection states and the transition table.
pub mod state;

/// Transport and observer traits.
pub mod duplex;

/// WebSocket transport and event loop.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use duplex::{DuplexTransport, Headers, TransportObserver};
pub use state::{ConnectionState, TransportStateMachine};
pub use websocket::WebSocketTransport;
