//! WebSocket transport and its event loop.
//!
//! [`WebSocketTransport`] implements [`DuplexTransport`] over
//! tokio-tungstenite. Each successful [`open`](DuplexTransport::open) spawns
//! one event loop task that owns the socket.
//!
//! # Event Loop
//!
//! The task handles:
//!
//! - The client handshake (frames queued meanwhile are flushed once open)
//! - Incoming binary and text frames, forwarded to the observer
//! - Outgoing frames from [`send`](DuplexTransport::send)
//! - Remote close and socket errors
//!
//! A locally requested close ends the loop without calling the observer.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use super::duplex::{DuplexTransport, Headers, TransportObserver};
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Close code reported when the stream ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

// ============================================================================
// Types
// ============================================================================

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ============================================================================
// TransportCommand
// ============================================================================

/// Internal commands for the event loop.
enum TransportCommand {
    /// Write a binary frame.
    Send(Bytes),
    /// Close the socket and stop.
    Close,
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Default [`DuplexTransport`] over tokio-tungstenite.
///
/// `wss://` URLs use rustls with the webpki root store.
///
/// # Thread Safety
///
/// `WebSocketTransport` is `Send + Sync`. All operations are non-blocking;
/// socket I/O happens on the spawned event loop. The runtime current at
/// construction hosts every event loop, so `open` may be called from threads
/// that are not part of it.
pub struct WebSocketTransport {
    /// Channel into the current event loop, if one is running.
    command_tx: Mutex<Option<mpsc::UnboundedSender<TransportCommand>>>,
    /// Runtime captured at construction.
    runtime: Option<Handle>,
}

impl WebSocketTransport {
    /// Creates an idle transport bound to the current tokio runtime, if any.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            command_tx: Mutex::new(None),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Returns `true` while an event loop is accepting frames.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.command_tx
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Builds the handshake request with the extra headers applied.
    fn build_request(url: &Url, headers: &Headers) -> Result<Request> {
        let mut request = url.as_str().into_client_request()?;

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header {name}: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        Ok(request)
    }

    /// Connects, then pumps frames until either side closes.
    async fn run_event_loop(
        request: Request,
        mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
        observer: Arc<dyn TransportObserver>,
    ) {
        // The query carries the access token; log the host only
        let host = request.uri().host().unwrap_or_default().to_owned();
        let mut queued = Vec::new();

        // Handshake, buffering frames the caller sends meanwhile
        let connect = connect_async(request);
        tokio::pin!(connect);

        let ws_stream: Socket = loop {
            tokio::select! {
                result = &mut connect => {
                    match result {
                        Ok((stream, _response)) => break stream,
                        Err(e) => {
                            error!(host = %host, error = %e, "WebSocket handshake failed");
                            observer.on_error(e.to_string());
                            return;
                        }
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send(data)) => queued.push(data),
                        Some(TransportCommand::Close) | None => {
                            debug!(host = %host, "Closed before handshake completed");
                            return;
                        }
                    }
                }
            }
        };

        debug!(host = %host, "WebSocket connected");
        observer.on_open();

        let (mut ws_write, mut ws_read) = ws_stream.split();

        for data in queued {
            let bytes = data.len();
            if let Err(e) = ws_write.send(Message::Binary(data)).await {
                error!(error = %e, "WebSocket write failed");
                observer.on_error(e.to_string());
                return;
            }
            trace!(bytes, "Flushed queued frame");
        }

        loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Binary(data))) => {
                            trace!(bytes = data.len(), "Binary frame received");
                            observer.on_binary_message(data);
                        }

                        Some(Ok(Message::Text(text))) => {
                            trace!(bytes = text.len(), "Text frame received");
                            observer.on_text_message(text.as_str().to_owned());
                        }

                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                                .unwrap_or((ABNORMAL_CLOSURE, String::new()));
                            debug!(code, reason = %reason, "WebSocket closed by remote");
                            observer.on_close(code, reason);
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            observer.on_error(e.to_string());
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            observer.on_close(ABNORMAL_CLOSURE, "stream ended".to_string());
                            break;
                        }

                        // Ping/Pong are answered by tungstenite
                        _ => {}
                    }
                }

                // Commands from the client
                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send(data)) => {
                            let bytes = data.len();
                            if let Err(e) = ws_write.send(Message::Binary(data)).await {
                                error!(error = %e, "WebSocket write failed");
                                observer.on_error(e.to_string());
                                break;
                            }
                            trace!(bytes, "Binary frame sent");
                        }

                        Some(TransportCommand::Close) | None => {
                            debug!("Close requested");
                            if let Err(e) = ws_write.close().await {
                                warn!(error = %e, "WebSocket close handshake failed");
                            }
                            break;
                        }
                    }
                }
            }
        }

        debug!(host = %host, "Event loop terminated");
    }
}

impl DuplexTransport for WebSocketTransport {
    fn open(&self, url: &Url, headers: &Headers, observer: Arc<dyn TransportObserver>) -> bool {
        let Some(runtime) = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            warn!("WebSocket open without a tokio runtime");
            return false;
        };

        let request = match Self::build_request(url, headers) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Invalid WebSocket request");
                return false;
            }
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        // Replace any previous loop
        if let Some(previous) = self.command_tx.lock().replace(command_tx) {
            let _ = previous.send(TransportCommand::Close);
        }

        debug!(host = url.host_str().unwrap_or_default(), "Opening WebSocket");
        runtime.spawn(Self::run_event_loop(request, command_rx, observer));
        true
    }

    fn send(&self, data: Bytes) -> bool {
        self.command_tx
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(TransportCommand::Send(data)).is_ok())
    }

    fn close(&self) {
        if let Some(command_tx) = self.command_tx.lock().take() {
            let _ = command_tx.send(TransportCommand::Close);
        }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::oneshot;

    #[test]
    fn test_build_request_applies_headers() {
        let url = Url::parse("wss://rooms.example.com/rtc?access_token=abc").expect("url");
        let headers = vec![("X-Region".to_string(), "eu-west".to_string())];

        let request = WebSocketTransport::build_request(&url, &headers).expect("request");

        assert_eq!(request.uri().host(), Some("rooms.example.com"));
        assert_eq!(
            request.headers().get("x-region").map(|v| v.as_bytes()),
            Some(&b"eu-west"[..])
        );
    }

    #[test]
    fn test_build_request_rejects_bad_header() {
        let url = Url::parse("ws://localhost:7880/rtc").expect("url");
        let headers = vec![("bad header".to_string(), "x".to_string())];

        let err = WebSocketTransport::build_request(&url, &headers).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_idle_transport_rejects_send() {
        let transport = WebSocketTransport::new();
        assert!(!transport.is_open());
        assert!(!transport.send(Bytes::from_static(b"\x42\x00")));
        transport.close();
    }

    #[test]
    fn test_open_outside_runtime_fails() {
        struct Silent;
        impl TransportObserver for Silent {
            fn on_open(&self) {}
            fn on_binary_message(&self, _data: Bytes) {}
            fn on_text_message(&self, _text: String) {}
            fn on_close(&self, _code: u16, _reason: String) {}
            fn on_error(&self, _message: String) {}
        }

        let transport = WebSocketTransport::new();
        let url = Url::parse("ws://localhost:7880/rtc").expect("url");
        assert!(!transport.open(&url, &[], Arc::new(Silent)));
        assert!(!transport.is_open());
    }

    struct ErrorSink(Mutex<Option<oneshot::Sender<String>>>);

    impl TransportObserver for ErrorSink {
        fn on_open(&self) {}
        fn on_binary_message(&self, _data: Bytes) {}
        fn on_text_message(&self, _text: String) {}
        fn on_close(&self, _code: u16, _reason: String) {}
        fn on_error(&self, message: String) {
            if let Some(tx) = self.0.lock().take() {
                let _ = tx.send(message);
            }
        }
    }

    /// URL of a local port nothing listens on.
    async fn refused_url() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        Url::parse(&format!("ws://127.0.0.1:{port}/rtc")).expect("url")
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error() {
        let (tx, rx) = oneshot::channel();
        let transport = WebSocketTransport::new();
        let url = refused_url().await;

        assert!(transport.open(&url, &[], Arc::new(ErrorSink(Mutex::new(Some(tx))))));
        let message = rx.await.expect("error reported");
        assert!(!message.is_empty());
    }

    #[tokio::test]
    async fn test_open_from_plain_thread() {
        let (tx, rx) = oneshot::channel();
        let transport = WebSocketTransport::new();
        let url = refused_url().await;
        let observer = Arc::new(ErrorSink(Mutex::new(Some(tx))));

        let opened = std::thread::scope(|scope| {
            scope
                .spawn(|| transport.open(&url, &[], observer))
                .join()
                .expect("opener thread")
        });

        assert!(opened);
        assert!(transport.is_open());
        let message = rx.await.expect("error reported");
        assert!(!message.is_empty());
    }
}
