//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`SignalClient`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use rtc_signal_client::SignalClient;
//!
//! # async fn example() -> rtc_signal_client::Result<()> {
//! let client = SignalClient::builder()
//!     .url("https://rooms.example.com")
//!     .token("eyJhbGciOi...")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::transport::{DuplexTransport, WebSocketTransport};

use super::options::SignalOptions;
use super::signal_client::SignalClient;

// ============================================================================
// SignalClientBuilder
// ============================================================================

/// Builder for configuring a [`SignalClient`] instance.
///
/// Use [`SignalClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct SignalClientBuilder {
    /// Server base URL.
    url: Option<String>,
    /// Access token.
    token: Option<String>,
    /// Connection options.
    options: SignalOptions,
    /// Transport override.
    transport: Option<Arc<dyn DuplexTransport>>,
}

impl fmt::Debug for SignalClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalClientBuilder")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

// ============================================================================
// SignalClientBuilder Implementation
// ============================================================================

impl SignalClientBuilder {
    /// Creates a new builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server base URL.
    ///
    /// # Arguments
    ///
    /// * `url` - `ws`, `wss`, `http` or `https` URL (e.g. "wss://rooms.example.com")
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the access token.
    #[inline]
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the connection options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SignalOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the default WebSocket transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn DuplexTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client with validation.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if url or token is missing
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::InvalidUrl`] if the url does not parse
    /// - [`Error::Config`] outside a tokio runtime
    pub fn build(self) -> Result<SignalClient> {
        let url = self.validate_url()?;
        let token = self.validate_token()?;

        self.options.validate().map_err(Error::config)?;

        let signal_url = self.options.signal_url(&url, &token)?;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));

        SignalClient::new(signal_url, self.options, transport)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SignalClientBuilder {
    /// Validates the server URL configuration.
    fn validate_url(&self) -> Result<String> {
        self.url.clone().ok_or_else(|| {
            Error::config(
                "Server URL is required. Use .url() to set it.\n\
                 Example: SignalClient::builder().url(\"wss://rooms.example.com\")",
            )
        })
    }

    /// Validates the token configuration.
    fn validate_token(&self) -> Result<String> {
        let token = self.token.clone().ok_or_else(|| {
            Error::config("Access token is required. Use .token() to set it.")
        })?;

        if token.trim().is_empty() {
            return Err(Error::config("Access token must not be empty"));
        }

        Ok(token)
    }
}

// ============================================================================
// Tests
// ============================================================================
