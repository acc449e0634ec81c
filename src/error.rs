//! Error types for the signaling client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Construction-time failures surface as [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use rtc_signal_client::{Result, SignalClient};
//!
//! fn example() -> Result<SignalClient> {
//!     SignalClient::builder()
//!         .url("wss://rooms.example.com")
//!         .token("eyJhbGciOi...")
//!         .build()
//! }
//! ```
//!
//! Runtime failures (malformed frames, rejected writes, transport resets,
//! liveness timeouts) are reported through listener callbacks instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | State | [`Error::InvalidTransition`] |
//! | Transport | [`Error::SendFailed`], [`Error::Transport`], [`Error::PongTimeout`] |
//! | External | [`Error::WebSocket`] |
//!
//! Frame decoding has its own [`DecodeError`], returned by the protocol
//! codecs and reported to listeners as a parse error.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options or builder input are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Server URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ========================================================================
    // State Errors
    // ========================================================================
    /// Requested transport state change is not allowed from the current state.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// State at the time of the request.
        from: ConnectionState,
        /// Requested state.
        to: ConnectionState,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The transport refused to accept an outbound frame.
    #[error("Send failed: {kind}")]
    SendFailed {
        /// Request kind that could not be written.
        kind: &'static str,
    },

    /// Failure reported by the underlying duplex transport.
    #[error("Transport error: {message}")]
    Transport {
        /// Description reported by the transport.
        message: String,
    },

    /// No pong arrived within the liveness window.
    #[error("Pong timeout after {timeout_ms}ms")]
    PongTimeout {
        /// Milliseconds waited for the pong.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid transition error.
    #[inline]
    pub fn invalid_transition(from: ConnectionState, to: ConnectionState) -> Self {
        Self::InvalidTransition { from, to }
    }

    /// Creates a send failure error.
    #[inline]
    pub fn send_failed(kind: &'static str) -> Self {
        Self::SendFailed { kind }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a pong timeout error.
    #[inline]
    pub fn pong_timeout(timeout_ms: u64) -> Self {
        Self::PongTimeout { timeout_ms }
    }
}

// ============================================================================
// DecodeError
// ============================================================================

/// Failure to parse an inbound signaling frame.
///
/// Decoding never panics; every malformed buffer maps to one of these.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Binary frame was not a well-formed protobuf envelope.
    #[error("invalid protobuf envelope: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// Text frame was not a valid JSON envelope.
    #[error("invalid JSON envelope: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Tests
// ============================================================================
