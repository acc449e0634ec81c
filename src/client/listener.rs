//! Listener interfaces and registration.
//!
//! Every callback receives the [`SignalClientId`] of the client that raised
//! it, so one listener object can serve several clients at once.
//!
//! All methods are required: a listener that ignores an event says so with an
//! empty body, and adding a message kind is a compile error for every
//! implementor rather than a silent drop.
//!
//! # Delivery Guarantees
//!
//! [`ListenerSet`] snapshots the registered listeners before delivering and
//! re-checks registration right before each call. A listener removed before or
//! during a fan-out (by another listener's callback, for instance) does not
//! receive that event, and no lock is held while user code runs.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::identifiers::{ListenerId, SignalClientId};
use crate::protocol::{
    ConnectionQualityUpdate, JoinResponse, LeaveRequest, MuteTrackRequest, ParticipantUpdate,
    Pong, ReconnectResponse, RequestResponse, RoomUpdate, SessionDescription, SpeakersChanged,
    StreamStateUpdate, SubscribedQualityUpdate, SubscriptionPermissionUpdate,
    SubscriptionResponse, TrackPublishedResponse, TrackSubscribed, TrackUnpublishedResponse,
    TrickleRequest,
};
use crate::transport::ConnectionState;

// ============================================================================
// SignalServerListener
// ============================================================================

/// Receives decoded server messages, one method per message kind.
pub trait SignalServerListener: Send + Sync {
    /// Room joined.
    fn on_join(&self, client_id: SignalClientId, join: &JoinResponse);

    /// Server offer for the subscriber peer connection.
    fn on_offer(&self, client_id: SignalClientId, offer: &SessionDescription);

    /// Server answer to the publisher offer.
    fn on_answer(&self, client_id: SignalClientId, answer: &SessionDescription);

    /// Remote ICE candidate.
    fn on_trickle(&self, client_id: SignalClientId, trickle: &TrickleRequest);

    /// Participants joined, left or changed.
    fn on_participant_update(&self, client_id: SignalClientId, update: &ParticipantUpdate);

    /// A local track was accepted.
    fn on_track_published(&self, client_id: SignalClientId, published: &TrackPublishedResponse);

    /// A local track was removed by the server.
    fn on_track_unpublished(
        &self,
        client_id: SignalClientId,
        unpublished: &TrackUnpublishedResponse,
    );

    /// The server asks the client to leave.
    fn on_leave(&self, client_id: SignalClientId, leave: &LeaveRequest);

    /// The server muted a local track.
    fn on_mute(&self, client_id: SignalClientId, mute: &MuteTrackRequest);

    /// Active speakers changed.
    fn on_speakers_changed(&self, client_id: SignalClientId, speakers: &SpeakersChanged);

    /// Room metadata or counters changed.
    fn on_room_update(&self, client_id: SignalClientId, update: &RoomUpdate);

    /// Link quality of one or more participants changed.
    fn on_connection_quality(&self, client_id: SignalClientId, update: &ConnectionQualityUpdate);

    /// Subscribed streams paused or resumed.
    fn on_stream_state_update(&self, client_id: SignalClientId, update: &StreamStateUpdate);

    /// Subscribers' layer demand for a local track changed.
    fn on_subscribed_quality_update(
        &self,
        client_id: SignalClientId,
        update: &SubscribedQualityUpdate,
    );

    /// Permission to subscribe to a remote track changed.
    fn on_subscription_permission_update(
        &self,
        client_id: SignalClientId,
        update: &SubscriptionPermissionUpdate,
    );

    /// Fresh access token for future reconnects.
    fn on_refresh_token(&self, client_id: SignalClientId, token: &str);

    /// Session resumed.
    fn on_reconnect(&self, client_id: SignalClientId, reconnect: &ReconnectResponse);

    /// Pong received; legacy pongs arrive with `timestamp == 0`.
    fn on_pong(&self, client_id: SignalClientId, pong: &Pong);

    /// A subscription attempt failed.
    fn on_subscription_response(&self, client_id: SignalClientId, response: &SubscriptionResponse);

    /// Server verdict on a client request.
    fn on_request_response(&self, client_id: SignalClientId, response: &RequestResponse);

    /// A local track gained its first subscriber.
    fn on_track_subscribed(&self, client_id: SignalClientId, subscribed: &TrackSubscribed);

    /// An inbound frame could not be decoded and was dropped.
    fn on_signal_parse_error(&self, client_id: SignalClientId);
}

// ============================================================================
// SignalTransportListener
// ============================================================================

/// Receives connection state changes and transport failures.
pub trait SignalTransportListener: Send + Sync {
    /// The client moved to `state`. Called once per accepted transition.
    fn on_transport_state_changed(&self, client_id: SignalClientId, state: ConnectionState);

    /// The transport failed or liveness was lost.
    fn on_transport_error(&self, client_id: SignalClientId, message: &str);
}

// ============================================================================
// ListenerSet
// ============================================================================

/// Registered listeners of one kind.
pub(crate) struct ListenerSet<L: ?Sized> {
    entries: RwLock<FxHashMap<ListenerId, Arc<L>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    /// Creates an empty set.
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Registers a listener.
    pub(crate) fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId::generate();
        self.entries.write().insert(id, listener);
        id
    }

    /// Unregisters a listener; returns `false` if it was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    /// Unregisters every listener.
    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of registered listeners.
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Calls `deliver` once for every listener still registered.
    pub(crate) fn for_each(&self, mut deliver: impl FnMut(&L)) {
        let snapshot: Vec<(ListenerId, Arc<L>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in snapshot {
            if self.entries.read().contains_key(&id) {
                deliver(&listener);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
