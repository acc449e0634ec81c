//! Signal client configuration.
//!
//! # Example
//!
//! ```ignore
//! use rtc_signal_client::SignalOptions;
//!
//! let options = SignalOptions::new()
//!     .with_adaptive_stream()
//!     .with_ping(10, 30)
//!     .with_header("X-Region", "eu-west");
//!
//! let url = options.signal_url("https://rooms.example.com", "eyJhbGciOi...")?;
//! // wss://rooms.example.com/rtc?access_token=eyJhbGciOi...&auto_subscribe=1&...
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default seconds between pings.
pub const DEFAULT_PING_INTERVAL_SECS: u32 = 5;

/// Default seconds to wait for a pong.
pub const DEFAULT_PING_TIMEOUT_SECS: u32 = 15;

/// Signaling protocol revision announced to the server.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 9;

/// SDK name announced to the server.
pub const DEFAULT_SDK: &str = "rust";

/// Path of the signaling endpoint.
const SIGNAL_PATH: &str = "rtc";

// ============================================================================
// SignalOptions
// ============================================================================

/// Connection options for a [`SignalClient`](crate::SignalClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalOptions {
    /// Subscribe to remote tracks as they are published.
    pub auto_subscribe: bool,

    /// Let the server pick layers from the rendered size.
    pub adaptive_stream: bool,

    /// Seconds between pings; 0 disables pinging.
    pub ping_interval: u32,

    /// Seconds to wait for a pong; 0 disables the timeout.
    pub ping_timeout: u32,

    /// Protocol revision announced in the query string.
    pub protocol_version: u32,

    /// SDK name announced in the query string.
    pub sdk: String,

    /// Extra headers sent with the opening handshake.
    pub headers: Vec<(String, String)>,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SignalOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            auto_subscribe: true,
            adaptive_stream: false,
            ping_interval: DEFAULT_PING_INTERVAL_SECS,
            ping_timeout: DEFAULT_PING_TIMEOUT_SECS,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            sdk: DEFAULT_SDK.to_string(),
            headers: Vec::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SignalOptions {
    /// Disables automatic subscription to remote tracks.
    #[inline]
    #[must_use]
    pub fn without_auto_subscribe(mut self) -> Self {
        self.auto_subscribe = false;
        self
    }

    /// Enables adaptive stream.
    #[inline]
    #[must_use]
    pub fn with_adaptive_stream(mut self) -> Self {
        self.adaptive_stream = true;
        self
    }

    /// Sets ping interval and timeout in seconds.
    #[inline]
    #[must_use]
    pub fn with_ping(mut self, interval_secs: u32, timeout_secs: u32) -> Self {
        self.ping_interval = interval_secs;
        self.ping_timeout = timeout_secs;
        self
    }

    /// Sets the announced protocol revision.
    #[inline]
    #[must_use]
    pub fn with_protocol_version(mut self, version: u32) -> Self {
        self.protocol_version = version;
        self
    }

    /// Sets the announced SDK name.
    #[inline]
    #[must_use]
    pub fn with_sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = sdk.into();
        self
    }

    /// Adds a handshake header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl SignalOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.ping_interval > 0 && self.ping_timeout > 0 && self.ping_timeout < self.ping_interval
        {
            return Err(format!(
                "Ping timeout ({}s) must not be shorter than the ping interval ({}s)",
                self.ping_timeout, self.ping_interval
            ));
        }

        if self.headers.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err("Header names must not be empty".to_string());
        }

        Ok(())
    }

    /// Returns the ping interval as a duration.
    #[inline]
    #[must_use]
    pub fn ping_interval_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.ping_interval))
    }

    /// Returns the ping timeout as a duration.
    #[inline]
    #[must_use]
    pub fn ping_timeout_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.ping_timeout))
    }

    /// Derives the signaling endpoint from a server base URL.
    ///
    /// `http`/`https` become `ws`/`wss`, `/rtc` is appended to the path and
    /// the token and options are passed as query parameters.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `base` does not parse
    /// - [`Error::Config`] if the scheme is not http(s) or ws(s)
    pub fn signal_url(&self, base: &str, token: &str) -> Result<Url> {
        let mut url = Url::parse(base)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::config(format!(
                    "Unsupported URL scheme '{other}'. Use ws, wss, http or https."
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::config(format!("Cannot use scheme '{scheme}' for {base}")))?;

        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{path}/{SIGNAL_PATH}"));

        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("access_token", token)
            .append_pair("auto_subscribe", flag(self.auto_subscribe))
            .append_pair("adaptive_stream", flag(self.adaptive_stream))
            .append_pair("sdk", &self.sdk)
            .append_pair("protocol", &self.protocol_version.to_string());

        Ok(url)
    }
}

/// Query-string form of a boolean.
#[inline]
const fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

// ============================================================================
// Tests
// ============================================================================
