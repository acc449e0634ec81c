//! Test doubles shared by the client tests.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use super::listener::{SignalServerListener, SignalTransportListener};
use crate::identifiers::SignalClientId;
use crate::protocol::{
    ConnectionQualityUpdate, JoinResponse, LeaveRequest, MuteTrackRequest, OutboundRequest,
    ParticipantUpdate, Pong, ReconnectResponse, RequestResponse, RoomUpdate, SessionDescription,
    SpeakersChanged, StreamStateUpdate, SubscribedQualityUpdate, SubscriptionPermissionUpdate,
    SubscriptionResponse, TrackPublishedResponse, TrackSubscribed, TrackUnpublishedResponse,
    TrickleRequest,
};
use crate::transport::{ConnectionState, DuplexTransport, Headers, TransportObserver};

// ============================================================================
// RecordingServerListener
// ============================================================================

/// Records every server callback as a short string.
#[derive(Default)]
pub(crate) struct RecordingServerListener {
    events: Mutex<Vec<String>>,
}

impl RecordingServerListener {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }
}

impl SignalServerListener for RecordingServerListener {
    fn on_join(&self, _client_id: SignalClientId, join: &JoinResponse) {
        let room = join.room.as_ref().map(|r| r.name.as_str()).unwrap_or("");
        self.record(format!("join:{room}"));
    }

    fn on_offer(&self, _client_id: SignalClientId, _offer: &SessionDescription) {
        self.record("offer");
    }

    fn on_answer(&self, _client_id: SignalClientId, _answer: &SessionDescription) {
        self.record("answer");
    }

    fn on_trickle(&self, _client_id: SignalClientId, _trickle: &TrickleRequest) {
        self.record("trickle");
    }

    fn on_participant_update(&self, _client_id: SignalClientId, update: &ParticipantUpdate) {
        self.record(format!("participant_update:{}", update.participants.len()));
    }

    fn on_track_published(&self, _client_id: SignalClientId, published: &TrackPublishedResponse) {
        self.record(format!("track_published:{}", published.cid));
    }

    fn on_track_unpublished(
        &self,
        _client_id: SignalClientId,
        unpublished: &TrackUnpublishedResponse,
    ) {
        self.record(format!("track_unpublished:{}", unpublished.track_sid));
    }

    fn on_leave(&self, _client_id: SignalClientId, _leave: &LeaveRequest) {
        self.record("leave");
    }

    fn on_mute(&self, _client_id: SignalClientId, mute: &MuteTrackRequest) {
        self.record(format!("mute:{}:{}", mute.sid, mute.muted));
    }

    fn on_speakers_changed(&self, _client_id: SignalClientId, speakers: &SpeakersChanged) {
        self.record(format!("speakers_changed:{}", speakers.speakers.len()));
    }

    fn on_room_update(&self, _client_id: SignalClientId, _update: &RoomUpdate) {
        self.record("room_update");
    }

    fn on_connection_quality(&self, _client_id: SignalClientId, _update: &ConnectionQualityUpdate) {
        self.record("connection_quality");
    }

    fn on_stream_state_update(&self, _client_id: SignalClientId, _update: &StreamStateUpdate) {
        self.record("stream_state_update");
    }

    fn on_subscribed_quality_update(
        &self,
        _client_id: SignalClientId,
        _update: &SubscribedQualityUpdate,
    ) {
        self.record("subscribed_quality_update");
    }

    fn on_subscription_permission_update(
        &self,
        _client_id: SignalClientId,
        _update: &SubscriptionPermissionUpdate,
    ) {
        self.record("subscription_permission_update");
    }

    fn on_refresh_token(&self, _client_id: SignalClientId, token: &str) {
        self.record(format!("refresh_token:{token}"));
    }

    fn on_reconnect(&self, _client_id: SignalClientId, _reconnect: &ReconnectResponse) {
        self.record("reconnect");
    }

    fn on_pong(&self, _client_id: SignalClientId, pong: &Pong) {
        self.record(format!(
            "pong:{}:{}",
            pong.last_ping_timestamp, pong.timestamp
        ));
    }

    fn on_subscription_response(
        &self,
        _client_id: SignalClientId,
        _response: &SubscriptionResponse,
    ) {
        self.record("subscription_response");
    }

    fn on_request_response(&self, _client_id: SignalClientId, response: &RequestResponse) {
        self.record(format!(
            "request_response:{}:{}",
            response.request_id, response.message
        ));
    }

    fn on_track_subscribed(&self, _client_id: SignalClientId, subscribed: &TrackSubscribed) {
        self.record(format!("track_subscribed:{}", subscribed.track_sid));
    }

    fn on_signal_parse_error(&self, _client_id: SignalClientId) {
        self.record("parse_error");
    }
}

// ============================================================================
// RecordingTransportListener
// ============================================================================

/// Records state changes (`"connected"`) and errors (`"error:<message>"`).
#[derive(Default)]
pub(crate) struct RecordingTransportListener {
    events: Mutex<Vec<String>>,
}

impl RecordingTransportListener {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl SignalTransportListener for RecordingTransportListener {
    fn on_transport_state_changed(&self, _client_id: SignalClientId, state: ConnectionState) {
        self.events.lock().push(state.to_string());
    }

    fn on_transport_error(&self, _client_id: SignalClientId, message: &str) {
        self.events.lock().push(format!("error:{message}"));
    }
}

// ============================================================================
// MockTransport
// ============================================================================

/// In-memory [`DuplexTransport`] that records writes and exposes the observer
/// so tests can play the server.
pub(crate) struct MockTransport {
    accept_open: AtomicBool,
    accept_sends: AtomicBool,
    sent: Mutex<Vec<Bytes>>,
    opened: Mutex<Vec<(Url, Vec<(String, String)>)>>,
    observer: Mutex<Option<Arc<dyn TransportObserver>>>,
    closes: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            accept_open: AtomicBool::new(true),
            accept_sends: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            observer: Mutex::new(None),
            closes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_accept_open(&self, accept: bool) {
        self.accept_open.store(accept, Ordering::SeqCst);
    }

    pub(crate) fn set_accept_sends(&self, accept: bool) {
        self.accept_sends.store(accept, Ordering::SeqCst);
    }

    /// Accepted frames, decoded back into requests.
    pub(crate) fn sent_requests(&self) -> Vec<OutboundRequest> {
        self.sent
            .lock()
            .iter()
            .filter_map(|data| OutboundRequest::decode(data).ok().flatten())
            .collect()
    }

    /// URLs and headers passed to `open`.
    pub(crate) fn opened(&self) -> Vec<(Url, Vec<(String, String)>)> {
        self.opened.lock().clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Observer handed over by the most recent `open`.
    pub(crate) fn observer(&self) -> Arc<dyn TransportObserver> {
        self.observer
            .lock()
            .clone()
            .expect("transport was never opened")
    }
}

impl DuplexTransport for MockTransport {
    fn open(&self, url: &Url, headers: &Headers, observer: Arc<dyn TransportObserver>) -> bool {
        self.opened.lock().push((url.clone(), headers.to_vec()));
        if !self.accept_open.load(Ordering::SeqCst) {
            return false;
        }
        *self.observer.lock() = Some(observer);
        true
    }

    fn send(&self, data: Bytes) -> bool {
        if !self.accept_sends.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().push(data);
        true
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
