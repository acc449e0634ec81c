//! Server-pushed updates.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::enums::json_enum;
use super::enums::{
    ConnectionQuality, RequestReason, StreamState, SubscriptionError, VideoQuality,
};
use super::room::{ParticipantInfo, Room, TrackInfo};

// ============================================================================
// ParticipantUpdate
// ============================================================================

/// Participants that joined, left or changed.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantUpdate {
    #[prost(message, repeated, tag = "1")]
    pub participants: Vec<ParticipantInfo>,
}

// ============================================================================
// Track Publication
// ============================================================================

/// Server accepted an `AddTrackRequest`.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackPublishedResponse {
    /// Client-side id from the originating request.
    #[prost(string, tag = "1")]
    pub cid: String,
    #[prost(message, optional, tag = "2")]
    pub track: Option<TrackInfo>,
}

/// Server removed one of the local tracks.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackUnpublishedResponse {
    #[prost(string, tag = "1")]
    pub track_sid: String,
}

/// First subscriber attached to a local track.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackSubscribed {
    #[prost(string, tag = "1")]
    pub track_sid: String,
}

// ============================================================================
// SpeakersChanged
// ============================================================================

/// Audio activity of one participant.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeakerInfo {
    #[prost(string, tag = "1")]
    pub sid: String,
    /// Audio level, 0.0 (silent) to 1.0 (loud).
    #[prost(float, tag = "2")]
    pub level: f32,
    #[prost(bool, tag = "3")]
    pub active: bool,
}

/// Active speaker set changed.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeakersChanged {
    #[prost(message, repeated, tag = "1")]
    pub speakers: Vec<SpeakerInfo>,
}

// ============================================================================
// RoomUpdate
// ============================================================================

/// Room metadata or counters changed.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomUpdate {
    #[prost(message, optional, tag = "1")]
    pub room: Option<Room>,
}

// ============================================================================
// ConnectionQualityUpdate
// ============================================================================

/// Link quality of one participant.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionQualityInfo {
    #[prost(string, tag = "1")]
    pub participant_sid: String,
    #[prost(enumeration = "ConnectionQuality", tag = "2")]
    #[serde(
        serialize_with = "json_enum::serialize::<ConnectionQuality, _>",
        deserialize_with = "json_enum::deserialize::<ConnectionQuality, _>"
    )]
    pub quality: i32,
    #[prost(float, tag = "3")]
    pub score: f32,
}

/// Batch of link quality changes.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionQualityUpdate {
    #[prost(message, repeated, tag = "1")]
    pub updates: Vec<ConnectionQualityInfo>,
}

// ============================================================================
// StreamStateUpdate
// ============================================================================

/// Forwarding state of one subscribed track.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamStateInfo {
    #[prost(string, tag = "1")]
    pub participant_sid: String,
    #[prost(string, tag = "2")]
    pub track_sid: String,
    #[prost(enumeration = "StreamState", tag = "3")]
    #[serde(
        serialize_with = "json_enum::serialize::<StreamState, _>",
        deserialize_with = "json_enum::deserialize::<StreamState, _>"
    )]
    pub state: i32,
}

/// Batch of stream state changes.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamStateUpdate {
    #[prost(message, repeated, tag = "1")]
    pub stream_states: Vec<StreamStateInfo>,
}

// ============================================================================
// SubscribedQualityUpdate
// ============================================================================

/// Whether any subscriber wants a given layer.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribedQuality {
    #[prost(enumeration = "VideoQuality", tag = "1")]
    #[serde(
        serialize_with = "json_enum::serialize::<VideoQuality, _>",
        deserialize_with = "json_enum::deserialize::<VideoQuality, _>"
    )]
    pub quality: i32,
    #[prost(bool, tag = "2")]
    pub enabled: bool,
}

/// Layers of a local track that subscribers currently consume.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribedQualityUpdate {
    #[prost(string, tag = "1")]
    pub track_sid: String,
    #[prost(message, repeated, tag = "2")]
    pub subscribed_qualities: Vec<SubscribedQuality>,
}

// ============================================================================
// Subscription Outcomes
// ============================================================================

/// Publisher granted or revoked permission for a remote track.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionPermissionUpdate {
    #[prost(string, tag = "1")]
    pub participant_sid: String,
    #[prost(string, tag = "2")]
    pub track_sid: String,
    #[prost(bool, tag = "3")]
    pub allowed: bool,
}

/// A subscription attempt failed.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionResponse {
    #[prost(string, tag = "1")]
    pub track_sid: String,
    #[prost(enumeration = "SubscriptionError", tag = "2")]
    #[serde(
        serialize_with = "json_enum::serialize::<SubscriptionError, _>",
        deserialize_with = "json_enum::deserialize::<SubscriptionError, _>"
    )]
    pub err: i32,
}

// ============================================================================
// RequestResponse
// ============================================================================

/// Server verdict on a client request; non-`Ok` reasons carry the error.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestResponse {
    #[prost(uint32, tag = "1")]
    pub request_id: u32,
    #[prost(enumeration = "RequestReason", tag = "2")]
    #[serde(
        serialize_with = "json_enum::serialize::<RequestReason, _>",
        deserialize_with = "json_enum::deserialize::<RequestReason, _>"
    )]
    pub reason: i32,
    #[prost(string, tag = "3")]
    pub message: String,
}

impl RequestResponse {
    /// Returns `true` if the server rejected the request.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.reason() != RequestReason::Ok
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use prost::Message;

    #[test]
    fn test_speakers_changed_roundtrip() {
        let update = SpeakersChanged {
            speakers: vec![
                SpeakerInfo {
                    sid: "PA_a".to_string(),
                    level: 0.75,
                    active: true,
                },
                SpeakerInfo {
                    sid: "PA_b".to_string(),
                    level: 0.0,
                    active: false,
                },
            ],
        };
        let decoded = SpeakersChanged::decode(update.encode_to_vec().as_slice()).expect("decode");
        assert_eq!(decoded, update);
    }

    #[test]
    fn test_connection_quality_roundtrip() {
        let update = ConnectionQualityUpdate {
            updates: vec![ConnectionQualityInfo {
                participant_sid: "PA_a".to_string(),
                quality: ConnectionQuality::Excellent.into(),
                score: 4.5,
            }],
        };
        let decoded =
            ConnectionQualityUpdate::decode(update.encode_to_vec().as_slice()).expect("decode");
        assert_eq!(decoded, update);
        assert_eq!(decoded.updates[0].quality(), ConnectionQuality::Excellent);
    }

    #[test]
    fn test_request_response_is_error() {
        let ok = RequestResponse::default();
        let denied = RequestResponse {
            request_id: 7,
            reason: RequestReason::NotAllowed.into(),
            message: "no publish permission".to_string(),
        };
        assert!(!ok.is_error());
        assert!(denied.is_error());
        assert_eq!(
            RequestResponse::decode(denied.encode_to_vec().as_slice()).expect("decode"),
            denied
        );
    }

    #[test]
    fn test_stream_state_json() {
        let json = r#"{"streamStates":[{"participantSid":"PA_a","trackSid":"TR_v","state":"PAUSED"}]}"#;
        let update: StreamStateUpdate = serde_json::from_str(json).expect("parse");
        assert_eq!(update.stream_states.len(), 1);
        assert_eq!(update.stream_states[0].state(), StreamState::Paused);
    }
}
