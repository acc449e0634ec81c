//! Signal client orchestrator.
//!
//! [`SignalClient`] ties the transport, the state machine, the request sender,
//! the response receiver and the ping/pong kit together.
//!
//! # Example
//!
//! ```no_run
//! use rtc_signal_client::{SignalClient, SignalOptions};
//!
//! # async fn example() -> rtc_signal_client::Result<()> {
//! let client = SignalClient::builder()
//!     .url("wss://rooms.example.com")
//!     .token("eyJhbGciOi...")
//!     .options(SignalOptions::new().with_adaptive_stream())
//!     .build()?;
//!
//! client.connect();
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! Public methods may be called from any thread. Transport callbacks and timer
//! fires run on the client's [`TaskQueue`], one at a time. Posted tasks hold
//! only a weak reference and do nothing once the client is gone.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::ReentrantMutex;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};
use url::Url;

use super::builder::SignalClientBuilder;
use super::dispatcher::ResponseReceiver;
use super::listener::{SignalServerListener, SignalTransportListener};
use super::options::SignalOptions;
use super::ping_pong::{PingPongKit, PingPongKitListener};
use super::sender::RequestSender;
use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, SignalClientId};
use crate::protocol::{
    AddTrackRequest, DisconnectReason, JoinResponse, LeaveRequest, MuteTrackRequest, Ping, Pong,
    SessionDescription, SignalMessage, TrickleRequest, UpdateSubscription, UpdateTrackSettings,
};
use crate::runtime::TaskQueue;
use crate::transport::{
    ConnectionState, DuplexTransport, TransportObserver, TransportStateMachine,
};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
pub(crate) struct SignalClientInner {
    /// Identity reported to listeners.
    id: SignalClientId,

    /// Signaling endpoint, token included.
    url: Url,

    /// Options the client was built with.
    options: SignalOptions,

    /// Connection state and transport listeners.
    state: TransportStateMachine,

    /// Inbound decoding and server listeners.
    receiver: ResponseReceiver,

    /// Outbound encoding.
    sender: RequestSender,

    /// Duplex channel to the server.
    transport: Arc<dyn DuplexTransport>,

    /// Serial executor for callbacks and timers.
    queue: TaskQueue,

    /// Liveness probing.
    ping_pong: PingPongKit,

    /// Last measured round-trip time in milliseconds.
    rtt: AtomicI64,

    /// Bumped on every connect and teardown; events from older connections
    /// are ignored.
    connection_epoch: AtomicU64,

    /// Serializes connect, disconnect and transport lifecycle events.
    lifecycle: ReentrantMutex<()>,

    /// Handle to this allocation, given to the ping/pong kit and observers.
    weak_self: Weak<SignalClientInner>,
}

// ============================================================================
// SignalClient
// ============================================================================

/// Client side of one signaling session.
///
/// The client exclusively owns its timers, dispatcher and transport. Dropping
/// it stops the timers, detaches every listener and closes the transport.
pub struct SignalClient {
    /// Shared inner state.
    pub(crate) inner: Arc<SignalClientInner>,
}

// ============================================================================
// SignalClient - Display
// ============================================================================

impl fmt::Debug for SignalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalClient")
            .field("id", &self.inner.id)
            .field("host", &self.inner.url.host_str())
            .field("state", &self.transport_state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SignalClient - Construction
// ============================================================================

impl SignalClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SignalClientBuilder {
        SignalClientBuilder::new()
    }

    /// Creates a client for an already derived signaling URL.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when called outside a tokio runtime.
    pub(crate) fn new(
        url: Url,
        options: SignalOptions,
        transport: Arc<dyn DuplexTransport>,
    ) -> Result<Self> {
        Handle::try_current()
            .map_err(|_| Error::config("SignalClient must be built inside a tokio runtime"))?;

        let id = SignalClientId::generate();
        let queue = TaskQueue::new(format!("signal-client-{id}"));
        let ping_pong = PingPongKit::new(
            queue.clone(),
            options.ping_interval_duration(),
            options.ping_timeout_duration(),
        );

        let inner = Arc::new_cyclic(|weak_self| SignalClientInner {
            id,
            url,
            options,
            state: TransportStateMachine::new(id),
            receiver: ResponseReceiver::new(id),
            sender: RequestSender::new(id, Arc::clone(&transport)),
            transport,
            queue,
            ping_pong,
            rtt: AtomicI64::new(0),
            connection_epoch: AtomicU64::new(0),
            lifecycle: ReentrantMutex::new(()),
            weak_self: weak_self.clone(),
        });

        debug!(
            client_id = %id,
            host = inner.url.host_str().unwrap_or_default(),
            "Signal client created"
        );

        Ok(Self { inner })
    }
}

// ============================================================================
// SignalClient - Public API
// ============================================================================

impl SignalClient {
    /// Returns the client identity passed to listeners.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SignalClientId {
        self.inner.id
    }

    /// Returns the signaling endpoint.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Returns the options the client was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SignalOptions {
        &self.inner.options
    }

    /// Starts connecting.
    ///
    /// Returns `true` when the client entered [`ConnectionState::Connecting`]
    /// and the transport started opening, or when it was already connecting
    /// or connected (nothing is reopened then). The handshake outcome arrives
    /// through transport listeners. May be called from any thread.
    pub fn connect(&self) -> bool {
        self.inner.connect()
    }

    /// Sends a leave request when connected, closes the transport and ends in
    /// [`ConnectionState::Disconnected`]. Stops ping/pong.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn transport_state(&self) -> ConnectionState {
        self.inner.state.state()
    }

    /// Returns `true` while connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport_state().is_connected()
    }

    /// Returns the last measured round-trip time in milliseconds, 0 before
    /// the first pong.
    #[inline]
    #[must_use]
    pub fn rtt(&self) -> i64 {
        self.inner.rtt.load(Ordering::Relaxed)
    }

    /// Registers a transport listener.
    pub fn add_transport_listener(&self, listener: Arc<dyn SignalTransportListener>) -> ListenerId {
        self.inner.state.add_listener(listener)
    }

    /// Unregisters a transport listener; returns `false` if unknown.
    pub fn remove_transport_listener(&self, id: ListenerId) -> bool {
        self.inner.state.remove_listener(id)
    }

    /// Registers a server listener.
    pub fn add_server_listener(&self, listener: Arc<dyn SignalServerListener>) -> ListenerId {
        self.inner.receiver.add_listener(listener)
    }

    /// Unregisters a server listener; returns `false` if unknown.
    pub fn remove_server_listener(&self, id: ListenerId) -> bool {
        self.inner.receiver.remove_listener(id)
    }

    /// Feeds a binary frame received outside the built-in transport.
    pub fn receive_binary(&self, data: Bytes) {
        self.inner.post(move |inner| inner.handle_binary(&data));
    }

    /// Feeds a text frame received outside the built-in transport.
    pub fn receive_text(&self, text: String) {
        self.inner.post(move |inner| inner.handle_text(&text));
    }
}

// ============================================================================
// SignalClient - Requests
// ============================================================================

impl SignalClient {
    /// Sends the publisher offer.
    pub fn send_offer(&self, offer: SessionDescription) -> bool {
        self.inner.sender.send_offer(offer)
    }

    /// Sends the subscriber answer.
    pub fn send_answer(&self, answer: SessionDescription) -> bool {
        self.inner.sender.send_answer(answer)
    }

    /// Sends a local ICE candidate.
    pub fn send_trickle(&self, trickle: TrickleRequest) -> bool {
        self.inner.sender.send_trickle(trickle)
    }

    /// Announces a local track.
    pub fn send_add_track(&self, add_track: AddTrackRequest) -> bool {
        self.inner.sender.send_add_track(add_track)
    }

    /// Mutes or unmutes a local track.
    pub fn send_mute_track(&self, mute: MuteTrackRequest) -> bool {
        self.inner.sender.send_mute_track(mute)
    }

    /// Changes remote track subscriptions.
    pub fn send_subscription(&self, subscription: UpdateSubscription) -> bool {
        self.inner.sender.send_subscription(subscription)
    }

    /// Changes receive settings of subscribed tracks.
    pub fn send_track_settings(&self, settings: UpdateTrackSettings) -> bool {
        self.inner.sender.send_track_settings(settings)
    }

    /// Sends a leave request without closing the transport.
    pub fn send_leave(&self, leave: LeaveRequest) -> bool {
        self.inner.sender.send_leave(leave)
    }
}

impl Drop for SignalClient {
    fn drop(&mut self) {
        let inner = &self.inner;
        let _lifecycle = inner.lifecycle.lock();

        inner.connection_epoch.fetch_add(1, Ordering::AcqRel);
        inner.ping_pong.stop();
        inner.receiver.clear_listeners();
        inner.state.clear_listeners();
        inner.transport.close();

        debug!(client_id = %inner.id, "Signal client dropped");
    }
}

// ============================================================================
// SignalClientInner - Lifecycle
// ============================================================================

impl SignalClientInner {
    fn connect(&self) -> bool {
        let _lifecycle = self.lifecycle.lock();

        match self.state.target_state() {
            ConnectionState::Connecting | ConnectionState::Connected => return true,
            current => {
                if !self.state.transition(ConnectionState::Connecting) {
                    debug!(client_id = %self.id, state = %current, "Connect ignored");
                    return false;
                }
            }
        }

        // A transport listener may have moved on from Connecting already
        if self.state.target_state() != ConnectionState::Connecting {
            debug!(client_id = %self.id, "Connect superseded by a listener");
            return false;
        }

        let epoch = self.connection_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let observer = Arc::new(ClientObserver {
            client: self.weak_self.clone(),
            queue: self.queue.clone(),
            epoch,
        });

        debug!(client_id = %self.id, epoch, "Opening transport");

        if self
            .transport
            .open(&self.url, &self.options.headers, observer)
        {
            return true;
        }

        warn!(client_id = %self.id, "Transport refused to open");
        self.state.notify_error("Failed to open transport");
        self.state.transition(ConnectionState::Disconnected);
        false
    }

    fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock();

        self.connection_epoch.fetch_add(1, Ordering::AcqRel);
        self.ping_pong.stop();

        match self.state.target_state() {
            ConnectionState::Disconnected => return,
            ConnectionState::Connected => {
                self.state.transition(ConnectionState::Disconnecting);
                // Best effort; the socket may already be gone
                self.sender.send_leave(LeaveRequest {
                    can_reconnect: false,
                    reason: DisconnectReason::ClientInitiated.into(),
                });
            }
            ConnectionState::Connecting | ConnectionState::Disconnecting => {}
        }

        self.transport.close();
        self.state.transition(ConnectionState::Disconnected);
        debug!(client_id = %self.id, "Disconnected");
    }

    /// Returns `true` if `epoch` belongs to the live connection.
    #[inline]
    fn is_current(&self, epoch: u64) -> bool {
        self.connection_epoch.load(Ordering::Acquire) == epoch
    }

    /// Runs `task` on the queue if the client is still alive by then.
    fn post(&self, task: impl FnOnce(&SignalClientInner) + Send + 'static) {
        let client = self.weak_self.clone();
        self.queue.post_task(move || {
            if let Some(inner) = client.upgrade() {
                task(&inner);
            }
        });
    }

    fn handle_open(&self, epoch: u64) {
        let _lifecycle = self.lifecycle.lock();
        if !self.is_current(epoch) {
            return;
        }

        if !self.state.transition(ConnectionState::Connected) {
            self.transport.close();
            return;
        }

        debug!(client_id = %self.id, "Transport open");
        self.rtt.store(0, Ordering::Relaxed);

        let listener: Weak<dyn PingPongKitListener> = self.weak_self.clone();
        self.ping_pong.start(listener);
    }

    fn handle_close(&self, epoch: u64, code: u16, reason: &str) {
        let _lifecycle = self.lifecycle.lock();
        if !self.is_current(epoch) {
            return;
        }

        debug!(client_id = %self.id, code, reason, "Transport closed by remote");
        self.connection_epoch.fetch_add(1, Ordering::AcqRel);
        self.ping_pong.stop();
        self.state.transition(ConnectionState::Disconnected);
    }

    fn handle_error(&self, epoch: u64, message: &str) {
        let _lifecycle = self.lifecycle.lock();
        if !self.is_current(epoch) {
            return;
        }

        let err = Error::transport(message);
        error!(client_id = %self.id, error = %err, "Connection failed");
        self.connection_epoch.fetch_add(1, Ordering::AcqRel);
        self.ping_pong.stop();
        self.state.notify_error(message);
        self.transport.close();
        self.state.transition(ConnectionState::Disconnected);
    }
}

// ============================================================================
// SignalClientInner - Inbound
// ============================================================================

impl SignalClientInner {
    fn handle_binary(&self, data: &[u8]) {
        if let Some(message) = self.receiver.decode_binary(data) {
            self.handle_message(&message);
        }
    }

    fn handle_text(&self, text: &str) {
        if let Some(message) = self.receiver.decode_text(text) {
            self.handle_message(&message);
        }
    }

    fn handle_message(&self, message: &SignalMessage) {
        match message {
            SignalMessage::Pong(pong) => self.handle_pong(pong),
            SignalMessage::Join(join) => self.apply_join_settings(join),
            _ => {}
        }
        self.receiver.dispatch(message);
    }

    fn handle_pong(&self, pong: &Pong) {
        self.ping_pong.notify_that_pong_received();

        if pong.last_ping_timestamp > 0 {
            let rtt = now_ms().saturating_sub(pong.last_ping_timestamp).max(0);
            self.rtt.store(rtt, Ordering::Relaxed);
        }
    }

    /// Adopts the server's ping settings; zero keeps the current value.
    fn apply_join_settings(&self, join: &JoinResponse) {
        if join.ping_interval <= 0 && join.ping_timeout <= 0 {
            return;
        }

        let (interval, timeout) = self.ping_pong.intervals();
        let interval = positive_secs(join.ping_interval).unwrap_or(interval);
        let timeout = positive_secs(join.ping_timeout).unwrap_or(timeout);

        self.ping_pong.set_intervals(interval, timeout);
    }
}

// ============================================================================
// SignalClientInner - Ping/Pong
// ============================================================================

impl PingPongKitListener for SignalClientInner {
    fn on_ping_requested(&self) -> bool {
        if !self.state.state().is_connected() {
            return false;
        }

        self.sender.send_ping(Ping {
            timestamp: now_ms(),
            rtt: self.rtt.load(Ordering::Relaxed),
        })
    }

    fn on_pong_timeout(&self) {
        let _lifecycle = self.lifecycle.lock();

        let (_, timeout) = self.ping_pong.intervals();
        let err = Error::pong_timeout(timeout.as_millis() as u64);
        warn!(client_id = %self.id, error = %err, "Connection lost");

        self.connection_epoch.fetch_add(1, Ordering::AcqRel);
        self.state.notify_error(err.to_string());
        self.transport.close();
        self.state.transition(ConnectionState::Disconnected);
    }
}

// ============================================================================
// ClientObserver
// ============================================================================

/// Transport observer bound to one connection attempt.
struct ClientObserver {
    client: Weak<SignalClientInner>,
    queue: TaskQueue,
    epoch: u64,
}

impl ClientObserver {
    fn post(&self, task: impl FnOnce(&SignalClientInner, u64) + Send + 'static) {
        let client = self.client.clone();
        let epoch = self.epoch;
        self.queue.post_task(move || {
            if let Some(inner) = client.upgrade() {
                task(&inner, epoch);
            }
        });
    }
}

impl TransportObserver for ClientObserver {
    fn on_open(&self) {
        self.post(|inner, epoch| inner.handle_open(epoch));
    }

    fn on_binary_message(&self, data: Bytes) {
        self.post(move |inner, epoch| {
            if inner.is_current(epoch) {
                inner.handle_binary(&data);
            }
        });
    }

    fn on_text_message(&self, text: String) {
        self.post(move |inner, epoch| {
            if inner.is_current(epoch) {
                inner.handle_text(&text);
            }
        });
    }

    fn on_close(&self, code: u16, reason: String) {
        self.post(move |inner, epoch| inner.handle_close(epoch, code, &reason));
    }

    fn on_error(&self, message: String) {
        self.post(move |inner, epoch| inner.handle_error(epoch, &message));
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Wall-clock milliseconds since the Unix epoch.
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn positive_secs(secs: i32) -> Option<Duration> {
    u64::try_from(secs)
        .ok()
        .filter(|&s| s > 0)
        .map(Duration::from_secs)
}

// ============================================================================
// Tests
// ============================================================================
