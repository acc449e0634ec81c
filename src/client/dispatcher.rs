//! Inbound frame decoding and demultiplexing.
//!
//! [`ResponseReceiver`] decodes a frame, folds legacy shapes into their
//! current form and calls exactly one [`SignalServerListener`] method on every
//! registered listener. It performs no I/O and schedules nothing.
//!
//! # Failure Policy
//!
//! | Input | Outcome |
//! |-------|---------|
//! | Malformed frame | `on_signal_parse_error`, frame dropped |
//! | Unknown message kind | dropped silently |
//! | Known message kind | the matching callback |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{trace, warn};

use super::listener::{ListenerSet, SignalServerListener};
use crate::identifiers::{ListenerId, SignalClientId};
use crate::protocol::SignalMessage;

// ============================================================================
// ResponseReceiver
// ============================================================================

/// Decodes server frames and routes them to server listeners.
pub struct ResponseReceiver {
    client_id: SignalClientId,
    listeners: ListenerSet<dyn SignalServerListener>,
}

impl ResponseReceiver {
    /// Creates a receiver with no listeners.
    #[must_use]
    pub fn new(client_id: SignalClientId) -> Self {
        Self {
            client_id,
            listeners: ListenerSet::new(),
        }
    }

    /// Registers a server listener.
    pub fn add_listener(&self, listener: Arc<dyn SignalServerListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregisters a server listener; returns `false` if unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Unregisters every listener.
    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    /// Decodes and dispatches a binary frame.
    pub fn receive_binary(&self, data: &[u8]) {
        if let Some(message) = self.decode_binary(data) {
            self.dispatch(&message);
        }
    }

    /// Decodes and dispatches a text frame.
    pub fn receive_text(&self, text: &str) {
        if let Some(message) = self.decode_text(text) {
            self.dispatch(&message);
        }
    }

    /// Decodes a binary frame, reporting a parse error on failure.
    ///
    /// The returned message is already normalized. Unknown kinds yield `None`
    /// without a parse error.
    pub fn decode_binary(&self, data: &[u8]) -> Option<SignalMessage> {
        match SignalMessage::decode(data) {
            Ok(Some(message)) => Some(message.normalize()),
            Ok(None) => {
                trace!(
                    client_id = %self.client_id,
                    bytes = data.len(),
                    "Dropping unknown signal message"
                );
                None
            }
            Err(e) => {
                warn!(
                    client_id = %self.client_id,
                    bytes = data.len(),
                    error = %e,
                    "Failed to decode binary signal frame"
                );
                self.report_parse_error();
                None
            }
        }
    }

    /// Decodes a text frame, reporting a parse error on failure.
    ///
    /// The returned message is already normalized.
    pub fn decode_text(&self, text: &str) -> Option<SignalMessage> {
        match SignalMessage::decode_text(text) {
            Ok(Some(message)) => Some(message.normalize()),
            Ok(None) => {
                trace!(
                    client_id = %self.client_id,
                    bytes = text.len(),
                    "Dropping unknown signal message"
                );
                None
            }
            Err(e) => {
                warn!(
                    client_id = %self.client_id,
                    bytes = text.len(),
                    error = %e,
                    "Failed to decode text signal frame"
                );
                self.report_parse_error();
                None
            }
        }
    }

    /// Calls the one listener method matching `message`.
    pub fn dispatch(&self, message: &SignalMessage) {
        let id = self.client_id;
        trace!(client_id = %id, kind = message.kind(), "Dispatching signal message");

        match message {
            SignalMessage::Join(join) => self.listeners.for_each(|l| l.on_join(id, join)),
            SignalMessage::Answer(answer) => self.listeners.for_each(|l| l.on_answer(id, answer)),
            SignalMessage::Offer(offer) => self.listeners.for_each(|l| l.on_offer(id, offer)),
            SignalMessage::Trickle(trickle) => {
                self.listeners.for_each(|l| l.on_trickle(id, trickle));
            }
            SignalMessage::Update(update) => {
                self.listeners
                    .for_each(|l| l.on_participant_update(id, update));
            }
            SignalMessage::TrackPublished(published) => {
                self.listeners
                    .for_each(|l| l.on_track_published(id, published));
            }
            SignalMessage::Leave(leave) => self.listeners.for_each(|l| l.on_leave(id, leave)),
            SignalMessage::Mute(mute) => self.listeners.for_each(|l| l.on_mute(id, mute)),
            SignalMessage::SpeakersChanged(speakers) => {
                self.listeners
                    .for_each(|l| l.on_speakers_changed(id, speakers));
            }
            SignalMessage::RoomUpdate(update) => {
                self.listeners.for_each(|l| l.on_room_update(id, update));
            }
            SignalMessage::ConnectionQuality(update) => {
                self.listeners
                    .for_each(|l| l.on_connection_quality(id, update));
            }
            SignalMessage::StreamStateUpdate(update) => {
                self.listeners
                    .for_each(|l| l.on_stream_state_update(id, update));
            }
            SignalMessage::SubscribedQualityUpdate(update) => {
                self.listeners
                    .for_each(|l| l.on_subscribed_quality_update(id, update));
            }
            SignalMessage::SubscriptionPermissionUpdate(update) => {
                self.listeners
                    .for_each(|l| l.on_subscription_permission_update(id, update));
            }
            SignalMessage::RefreshToken(token) => {
                self.listeners.for_each(|l| l.on_refresh_token(id, token));
            }
            SignalMessage::TrackUnpublished(unpublished) => {
                self.listeners
                    .for_each(|l| l.on_track_unpublished(id, unpublished));
            }
            SignalMessage::LegacyPong(_) => {
                // Callers normally normalize first
                self.dispatch(&message.clone().normalize());
            }
            SignalMessage::Reconnect(reconnect) => {
                self.listeners.for_each(|l| l.on_reconnect(id, reconnect));
            }
            SignalMessage::Pong(pong) => self.listeners.for_each(|l| l.on_pong(id, pong)),
            SignalMessage::SubscriptionResponse(response) => {
                self.listeners
                    .for_each(|l| l.on_subscription_response(id, response));
            }
            SignalMessage::RequestResponse(response) => {
                self.listeners
                    .for_each(|l| l.on_request_response(id, response));
            }
            SignalMessage::TrackSubscribed(subscribed) => {
                self.listeners
                    .for_each(|l| l.on_track_subscribed(id, subscribed));
            }
        }
    }

    fn report_parse_error(&self) {
        let id = self.client_id;
        self.listeners.for_each(|l| l.on_signal_parse_error(id));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::testing::RecordingServerListener;
    use crate::protocol::{
        JoinResponse, Pong, RequestReason, RequestResponse, Room, SessionDescription,
    };

    fn receiver() -> (ResponseReceiver, Arc<RecordingServerListener>) {
        let receiver = ResponseReceiver::new(SignalClientId::generate());
        let listener = Arc::new(RecordingServerListener::new());
        receiver.add_listener(listener.clone());
        (receiver, listener)
    }

    #[test]
    fn test_join_dispatches_once() {
        let (receiver, listener) = receiver();
        let join = SignalMessage::Join(JoinResponse {
            room: Some(Room {
                name: "standup".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });

        receiver.receive_binary(&join.to_bytes());

        assert_eq!(listener.events(), vec!["join:standup"]);
    }

    #[test]
    fn test_offer_is_not_answer() {
        let (receiver, listener) = receiver();

        receiver.receive_binary(&SignalMessage::Offer(SessionDescription::offer("v=0")).to_bytes());

        assert_eq!(listener.events(), vec!["offer"]);
    }

    #[test]
    fn test_malformed_frame_reports_parse_error() {
        let (receiver, listener) = receiver();

        // field 1, length 10, but only one byte follows
        receiver.receive_binary(&[0x0a, 0x0a, 0x01]);
        receiver.receive_text("{not json");

        assert_eq!(listener.events(), vec!["parse_error", "parse_error"]);
    }

    #[test]
    fn test_unknown_kind_is_dropped() {
        let (receiver, listener) = receiver();

        // field 99, varint
        receiver.receive_binary(&[0x98, 0x06, 0x01]);
        receiver.receive_binary(&[]);
        receiver.receive_text(r#"{"futureThing":{"x":1}}"#);

        assert!(listener.events().is_empty());
    }

    #[test]
    fn test_legacy_and_current_pong_share_callback() {
        let (receiver, listener) = receiver();

        receiver.receive_binary(&SignalMessage::LegacyPong(1_000).to_bytes());
        receiver.receive_binary(
            &SignalMessage::Pong(Pong {
                last_ping_timestamp: 2_000,
                timestamp: 2_050,
            })
            .to_bytes(),
        );

        assert_eq!(listener.events(), vec!["pong:1000:0", "pong:2000:2050"]);
    }

    #[test]
    fn test_text_frame_dispatch() {
        let (receiver, listener) = receiver();

        receiver.receive_text(r#"{"refreshToken":"eyJ.new"}"#);
        receiver.receive_text(r#"{"pong":77}"#);

        assert_eq!(listener.events(), vec!["refresh_token:eyJ.new", "pong:77:0"]);
    }

    #[test]
    fn test_request_response_payload() {
        let (receiver, listener) = receiver();
        let response = RequestResponse {
            request_id: 7,
            reason: RequestReason::NotAllowed.into(),
            message: "denied".to_string(),
        };

        receiver.receive_binary(&SignalMessage::RequestResponse(response).to_bytes());

        assert_eq!(listener.events(), vec!["request_response:7:denied"]);
    }

    #[test]
    fn test_removed_listener_gets_nothing() {
        let (receiver, listener) = receiver();
        let other = Arc::new(RecordingServerListener::new());
        let other_id = receiver.add_listener(other.clone());

        assert!(receiver.remove_listener(other_id));
        receiver.receive_binary(&SignalMessage::RefreshToken("t".to_string()).to_bytes());

        assert_eq!(listener.events().len(), 1);
        assert!(other.events().is_empty());
    }
}
