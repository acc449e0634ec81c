//! Session negotiation payloads.
//!
//! Messages exchanged while setting up and steering the peer connections:
//! offers/answers, trickle candidates, track publication and subscription
//! control, leave and liveness.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::enums::json_enum;
use super::enums::{DisconnectReason, SignalTarget, TrackSource, TrackType, VideoQuality};

// ============================================================================
// SessionDescription
// ============================================================================

/// An SDP offer or answer.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDescription {
    /// `"offer"` or `"answer"`.
    #[prost(string, tag = "1")]
    #[serde(rename = "type")]
    pub sdp_type: String,
    /// SDP body.
    #[prost(string, tag = "2")]
    pub sdp: String,
    /// Negotiation round identifier.
    #[prost(uint32, tag = "3")]
    pub id: u32,
}

impl SessionDescription {
    /// Creates an offer.
    #[must_use]
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: "offer".to_string(),
            sdp: sdp.into(),
            id: 0,
        }
    }

    /// Creates an answer.
    #[must_use]
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: "answer".to_string(),
            sdp: sdp.into(),
            id: 0,
        }
    }
}

// ============================================================================
// TrickleRequest
// ============================================================================

/// An incremental ICE candidate.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrickleRequest {
    /// JSON-serialized `RTCIceCandidateInit`.
    #[prost(string, tag = "1")]
    pub candidate_init: String,
    /// Peer connection the candidate belongs to.
    #[prost(enumeration = "SignalTarget", tag = "2")]
    #[serde(
        serialize_with = "json_enum::serialize::<SignalTarget, _>",
        deserialize_with = "json_enum::deserialize::<SignalTarget, _>"
    )]
    pub target: i32,
    /// Marks the end of candidates for this target.
    #[prost(bool, tag = "3")]
    #[serde(rename = "final")]
    pub is_final: bool,
}

// ============================================================================
// VideoLayer
// ============================================================================

/// One simulcast layer of a video track.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoLayer {
    #[prost(enumeration = "VideoQuality", tag = "1")]
    #[serde(
        serialize_with = "json_enum::serialize::<VideoQuality, _>",
        deserialize_with = "json_enum::deserialize::<VideoQuality, _>"
    )]
    pub quality: i32,
    #[prost(uint32, tag = "2")]
    pub width: u32,
    #[prost(uint32, tag = "3")]
    pub height: u32,
    #[prost(uint32, tag = "4")]
    pub bitrate: u32,
    #[prost(uint32, tag = "5")]
    pub ssrc: u32,
}

// ============================================================================
// AddTrackRequest
// ============================================================================

/// Announces a local track before it is published.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddTrackRequest {
    /// Client-side track id, echoed back in `TrackPublishedResponse`.
    #[prost(string, tag = "1")]
    pub cid: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(enumeration = "TrackType", tag = "3")]
    #[serde(
        rename = "type",
        serialize_with = "json_enum::serialize::<TrackType, _>",
        deserialize_with = "json_enum::deserialize::<TrackType, _>"
    )]
    pub track_type: i32,
    #[prost(uint32, tag = "4")]
    pub width: u32,
    #[prost(uint32, tag = "5")]
    pub height: u32,
    #[prost(bool, tag = "6")]
    pub muted: bool,
    #[prost(bool, tag = "7")]
    pub disable_dtx: bool,
    #[prost(enumeration = "TrackSource", tag = "8")]
    #[serde(
        serialize_with = "json_enum::serialize::<TrackSource, _>",
        deserialize_with = "json_enum::deserialize::<TrackSource, _>"
    )]
    pub source: i32,
    #[prost(message, repeated, tag = "9")]
    pub layers: Vec<VideoLayer>,
}

// ============================================================================
// MuteTrackRequest
// ============================================================================

/// Mutes or unmutes a published track.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MuteTrackRequest {
    #[prost(string, tag = "1")]
    pub sid: String,
    #[prost(bool, tag = "2")]
    pub muted: bool,
}

// ============================================================================
// UpdateSubscription
// ============================================================================

/// Tracks of one remote participant.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantTracks {
    #[prost(string, tag = "1")]
    pub participant_sid: String,
    #[prost(string, repeated, tag = "2")]
    pub track_sids: Vec<String>,
}

/// Subscribes to or unsubscribes from remote tracks.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSubscription {
    #[prost(string, repeated, tag = "1")]
    pub track_sids: Vec<String>,
    #[prost(bool, tag = "2")]
    pub subscribe: bool,
    #[prost(message, repeated, tag = "3")]
    pub participant_tracks: Vec<ParticipantTracks>,
}

// ============================================================================
// UpdateTrackSettings
// ============================================================================

/// Receiver-side preferences for subscribed tracks.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTrackSettings {
    #[prost(string, repeated, tag = "1")]
    pub track_sids: Vec<String>,
    /// Stop forwarding the tracks without unsubscribing.
    #[prost(bool, tag = "3")]
    pub disabled: bool,
    #[prost(enumeration = "VideoQuality", tag = "4")]
    #[serde(
        serialize_with = "json_enum::serialize::<VideoQuality, _>",
        deserialize_with = "json_enum::deserialize::<VideoQuality, _>"
    )]
    pub quality: i32,
    #[prost(uint32, tag = "5")]
    pub width: u32,
    #[prost(uint32, tag = "6")]
    pub height: u32,
    #[prost(uint32, tag = "7")]
    pub fps: u32,
    #[prost(uint32, tag = "8")]
    pub priority: u32,
}

// ============================================================================
// LeaveRequest
// ============================================================================

/// Sent by either side when a participant leaves the room.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaveRequest {
    #[prost(bool, tag = "1")]
    pub can_reconnect: bool,
    #[prost(enumeration = "DisconnectReason", tag = "2")]
    #[serde(
        serialize_with = "json_enum::serialize::<DisconnectReason, _>",
        deserialize_with = "json_enum::deserialize::<DisconnectReason, _>"
    )]
    pub reason: i32,
}

// ============================================================================
// Ping / Pong
// ============================================================================

/// Liveness ping sent by the client.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ping {
    /// Client wall clock, milliseconds since the Unix epoch.
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
    /// Last measured round-trip time in milliseconds.
    #[prost(int64, tag = "2")]
    pub rtt: i64,
}

/// Liveness reply from the server.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pong {
    /// Echo of the `timestamp` of the ping being answered.
    #[prost(int64, tag = "1")]
    pub last_ping_timestamp: i64,
    /// Server wall clock, milliseconds; zero when the server did not report it.
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

// ============================================================================
// Tests
// ============================================================================
