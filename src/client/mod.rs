//! Signal client and its collaborators.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────────┐
//!  application ──►│ SignalClient                             │
//!                 │   ├─ RequestSender ──► DuplexTransport ──┼──► server
//!                 │   ├─ TransportStateMachine               │
//!                 │   ├─ PingPongKit (timers on TaskQueue)   │
//!  listeners  ◄───┤   └─ ResponseReceiver ◄── observer ◄─────┼─── server
//!                 └──────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `listener` | Listener traits and registration |
//! | `sender` | Typed outbound requests |
//! | `dispatcher` | Inbound decoding and routing |
//! | `ping_pong` | Liveness probing |
//! | `options` | Connection options |
//! | `builder` | Client builder |
//! | `signal_client` | The orchestrator |

// ============================================================================
// Submodules
// ============================================================================

/// Listener traits and registration.
pub mod listener;

/// Typed outbound requests.
pub mod sender;

/// Inbound decoding and routing.
pub mod dispatcher;

/// Liveness probing.
pub mod ping_pong;

/// Connection options.
pub mod options;

/// Client builder.
pub mod builder;

/// The orchestrator.
pub mod signal_client;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SignalClientBuilder;
pub use dispatcher::ResponseReceiver;
pub use listener::{SignalServerListener, SignalTransportListener};
pub use options::SignalOptions;
pub use ping_pong::{PingPongKit, PingPongKitListener};
pub use sender::RequestSender;
pub use signal_client::SignalClient;
