//! Server → client envelope.
//!
//! [`SignalMessage`] is the `oneof message` of the server's `SignalResponse`.
//! Binary frames carry the protobuf encoding, text frames the JSON rendering
//! of the same envelope.
//!
//! # Legacy Representations
//!
//! Older servers answer pings with a bare `int64` pong. Both shapes decode
//! faithfully; [`SignalMessage::normalize`] folds the legacy one into
//! [`SignalMessage::Pong`] before dispatch.
//!
//! # Unknown Messages
//!
//! An envelope whose only member is a field this client does not know (or an
//! empty envelope) decodes to `Ok(None)`. Callers drop it without reporting a
//! parse error.

// ============================================================================
// Imports
// ============================================================================

use bytes::{Bytes, BytesMut};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;

use super::room::{JoinResponse, ReconnectResponse};
use super::rtc::{LeaveRequest, MuteTrackRequest, Pong, SessionDescription, TrickleRequest};
use super::updates::{
    ConnectionQualityUpdate, ParticipantUpdate, RequestResponse, RoomUpdate, SpeakersChanged,
    StreamStateUpdate, SubscribedQualityUpdate, SubscriptionPermissionUpdate,
    SubscriptionResponse, TrackPublishedResponse, TrackSubscribed, TrackUnpublishedResponse,
};

/// Top-level keys of the JSON envelope this client understands.
const JSON_KEYS: &[&str] = &[
    "join",
    "answer",
    "offer",
    "trickle",
    "update",
    "trackPublished",
    "leave",
    "mute",
    "speakersChanged",
    "roomUpdate",
    "connectionQuality",
    "streamStateUpdate",
    "subscribedQualityUpdate",
    "subscriptionPermissionUpdate",
    "refreshToken",
    "trackUnpublished",
    "pong",
    "reconnect",
    "pongResp",
    "subscriptionResponse",
    "requestResponse",
    "trackSubscribed",
];

// ============================================================================
// SignalMessage
// ============================================================================

/// A decoded message from the signaling server.
///
/// Constructed on decode, consumed by dispatch, then dropped.
#[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalMessage {
    /// Room joined.
    #[prost(message, tag = "1")]
    Join(JoinResponse),
    /// Answer to the publisher offer.
    #[prost(message, tag = "2")]
    Answer(SessionDescription),
    /// Offer for the subscriber peer connection.
    #[prost(message, tag = "3")]
    Offer(SessionDescription),
    /// Remote ICE candidate.
    #[prost(message, tag = "4")]
    Trickle(TrickleRequest),
    /// Participants changed.
    #[prost(message, tag = "5")]
    Update(ParticipantUpdate),
    /// Local track accepted.
    #[prost(message, tag = "6")]
    TrackPublished(TrackPublishedResponse),
    /// Server asks the client to leave.
    #[prost(message, tag = "8")]
    Leave(LeaveRequest),
    /// Server muted a local track.
    #[prost(message, tag = "9")]
    Mute(MuteTrackRequest),
    /// Active speakers changed.
    #[prost(message, tag = "10")]
    SpeakersChanged(SpeakersChanged),
    /// Room state changed.
    #[prost(message, tag = "11")]
    RoomUpdate(RoomUpdate),
    /// Link quality changed.
    #[prost(message, tag = "12")]
    ConnectionQuality(ConnectionQualityUpdate),
    /// Subscribed stream paused or resumed.
    #[prost(message, tag = "13")]
    StreamStateUpdate(StreamStateUpdate),
    /// Subscribers' layer demand changed.
    #[prost(message, tag = "14")]
    SubscribedQualityUpdate(SubscribedQualityUpdate),
    /// Subscription permission changed.
    #[prost(message, tag = "15")]
    SubscriptionPermissionUpdate(SubscriptionPermissionUpdate),
    /// Fresh access token for future reconnects.
    #[prost(string, tag = "16")]
    RefreshToken(String),
    /// Local track removed.
    #[prost(message, tag = "17")]
    TrackUnpublished(TrackUnpublishedResponse),
    /// Old-style pong carrying only the server timestamp.
    #[prost(int64, tag = "18")]
    #[serde(rename = "pong")]
    LegacyPong(i64),
    /// Session resumed.
    #[prost(message, tag = "19")]
    Reconnect(ReconnectResponse),
    /// Pong echoing the ping timestamp.
    #[prost(message, tag = "20")]
    #[serde(rename = "pongResp")]
    Pong(Pong),
    /// Subscription failed.
    #[prost(message, tag = "21")]
    SubscriptionResponse(SubscriptionResponse),
    /// Verdict on a client request.
    #[prost(message, tag = "22")]
    RequestResponse(RequestResponse),
    /// Local track gained its first subscriber.
    #[prost(message, tag = "23")]
    TrackSubscribed(TrackSubscribed),
}

/// The `SignalResponse` envelope: a single `oneof message` field.
#[derive(Clone, PartialEq, ::prost::Message)]
struct SignalResponse {
    #[prost(
        oneof = "SignalMessage",
        tags = "1, 2, 3, 4, 5, 6, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23"
    )]
    message: Option<SignalMessage>,
}

impl SignalMessage {
    /// Short name of the message kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Answer(_) => "answer",
            Self::Offer(_) => "offer",
            Self::Trickle(_) => "trickle",
            Self::Update(_) => "participant_update",
            Self::TrackPublished(_) => "track_published",
            Self::Leave(_) => "leave",
            Self::Mute(_) => "mute",
            Self::SpeakersChanged(_) => "speakers_changed",
            Self::RoomUpdate(_) => "room_update",
            Self::ConnectionQuality(_) => "connection_quality",
            Self::StreamStateUpdate(_) => "stream_state_update",
            Self::SubscribedQualityUpdate(_) => "subscribed_quality_update",
            Self::SubscriptionPermissionUpdate(_) => "subscription_permission_update",
            Self::RefreshToken(_) => "refresh_token",
            Self::TrackUnpublished(_) => "track_unpublished",
            Self::LegacyPong(_) => "legacy_pong",
            Self::Reconnect(_) => "reconnect",
            Self::Pong(_) => "pong",
            Self::SubscriptionResponse(_) => "subscription_response",
            Self::RequestResponse(_) => "request_response",
            Self::TrackSubscribed(_) => "track_subscribed",
        }
    }

    /// Folds deprecated wire shapes into their current equivalent.
    ///
    /// A legacy pong only carries the timestamp of the ping it answers.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Self::LegacyPong(last_ping_timestamp) => Self::Pong(Pong {
                last_ping_timestamp,
                timestamp: 0,
            }),
            other => other,
        }
    }

    /// Decodes a binary frame; `None` when it holds no known message.
    ///
    /// When several members appear on the wire the last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Protobuf`] for any buffer that is not a
    /// well-formed envelope. Never panics.
    pub fn decode(buf: &[u8]) -> Result<Option<Self>, DecodeError> {
        Ok(SignalResponse::decode(buf)?.message)
    }

    /// Decodes a text frame holding the JSON envelope.
    ///
    /// A single unrecognized top-level key yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] for invalid JSON or a malformed payload.
    pub fn decode_text(text: &str) -> Result<Option<Self>, DecodeError> {
        let value: Value = serde_json::from_str(text)?;

        if let Value::Object(map) = &value
            && map.len() == 1
            && let Some(key) = map.keys().next()
            && !JSON_KEYS.contains(&key.as_str())
        {
            return Ok(None);
        }

        Ok(Some(serde_json::from_value(value)?))
    }

    /// Encodes the envelope.
    ///
    /// The client never sends these; servers, relays and tests do.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

// ============================================================================
// Tests
// ============================================================================
