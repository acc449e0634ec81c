//! Room, participant and track descriptions.
//!
//! Carried by the join and reconnect handshakes and by most server updates.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::enums::json_enum;
use super::enums::{ParticipantState, TrackSource, TrackType};
use super::rtc::VideoLayer;

// ============================================================================
// Room
// ============================================================================

/// Room-wide state.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    #[prost(string, tag = "1")]
    pub sid: String,
    #[prost(string, tag = "2")]
    pub name: String,
    /// Seconds an empty room is kept alive.
    #[prost(uint32, tag = "3")]
    pub empty_timeout: u32,
    #[prost(uint32, tag = "4")]
    pub max_participants: u32,
    /// Unix seconds.
    #[prost(int64, tag = "5")]
    pub creation_time: i64,
    #[prost(string, tag = "8")]
    pub metadata: String,
    #[prost(uint32, tag = "9")]
    pub num_participants: u32,
    #[prost(bool, tag = "10")]
    pub active_recording: bool,
    #[prost(uint32, tag = "11")]
    pub num_publishers: u32,
}

// ============================================================================
// TrackInfo
// ============================================================================

/// A published track as the server sees it.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackInfo {
    #[prost(string, tag = "1")]
    pub sid: String,
    #[prost(enumeration = "TrackType", tag = "2")]
    #[serde(
        rename = "type",
        serialize_with = "json_enum::serialize::<TrackType, _>",
        deserialize_with = "json_enum::deserialize::<TrackType, _>"
    )]
    pub track_type: i32,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(bool, tag = "4")]
    pub muted: bool,
    #[prost(uint32, tag = "5")]
    pub width: u32,
    #[prost(uint32, tag = "6")]
    pub height: u32,
    #[prost(bool, tag = "7")]
    pub simulcast: bool,
    #[prost(bool, tag = "8")]
    pub disable_dtx: bool,
    #[prost(enumeration = "TrackSource", tag = "9")]
    #[serde(
        serialize_with = "json_enum::serialize::<TrackSource, _>",
        deserialize_with = "json_enum::deserialize::<TrackSource, _>"
    )]
    pub source: i32,
    #[prost(message, repeated, tag = "10")]
    pub layers: Vec<VideoLayer>,
    #[prost(string, tag = "11")]
    pub mime_type: String,
    #[prost(string, tag = "12")]
    pub mid: String,
}

// ============================================================================
// ParticipantInfo
// ============================================================================

/// A participant and the tracks it publishes.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantInfo {
    #[prost(string, tag = "1")]
    pub sid: String,
    #[prost(string, tag = "2")]
    pub identity: String,
    #[prost(enumeration = "ParticipantState", tag = "3")]
    #[serde(
        serialize_with = "json_enum::serialize::<ParticipantState, _>",
        deserialize_with = "json_enum::deserialize::<ParticipantState, _>"
    )]
    pub state: i32,
    #[prost(message, repeated, tag = "4")]
    pub tracks: Vec<TrackInfo>,
    #[prost(string, tag = "5")]
    pub metadata: String,
    /// Unix seconds.
    #[prost(int64, tag = "6")]
    pub joined_at: i64,
    #[prost(string, tag = "9")]
    pub name: String,
    /// Monotonic per-participant version; stale updates carry a lower value.
    #[prost(uint32, tag = "10")]
    pub version: u32,
    #[prost(string, tag = "12")]
    pub region: String,
    #[prost(bool, tag = "13")]
    pub is_publisher: bool,
}

// ============================================================================
// IceServer
// ============================================================================

/// STUN/TURN server handed out by the signaling server.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IceServer {
    #[prost(string, repeated, tag = "1")]
    pub urls: Vec<String>,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(string, tag = "3")]
    pub credential: String,
}

// ============================================================================
// JoinResponse
// ============================================================================

/// First message after the socket opens: the room and the local participant.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinResponse {
    #[prost(message, optional, tag = "1")]
    pub room: Option<Room>,
    #[prost(message, optional, tag = "2")]
    pub participant: Option<ParticipantInfo>,
    #[prost(message, repeated, tag = "3")]
    pub other_participants: Vec<ParticipantInfo>,
    #[prost(string, tag = "4")]
    pub server_version: String,
    #[prost(message, repeated, tag = "5")]
    pub ice_servers: Vec<IceServer>,
    /// The subscriber peer connection drives negotiation.
    #[prost(bool, tag = "6")]
    pub subscriber_primary: bool,
    #[prost(string, tag = "7")]
    pub alternative_url: String,
    #[prost(string, tag = "9")]
    pub server_region: String,
    /// Seconds; zero keeps the client's configured value.
    #[prost(int32, tag = "10")]
    pub ping_timeout: i32,
    /// Seconds; zero keeps the client's configured value.
    #[prost(int32, tag = "11")]
    pub ping_interval: i32,
}

// ============================================================================
// ReconnectResponse
// ============================================================================

/// Reply to a resumed session.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectResponse {
    #[prost(message, repeated, tag = "1")]
    pub ice_servers: Vec<IceServer>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use prost::Message;

    fn sample_join() -> JoinResponse {
        JoinResponse {
            room: Some(Room {
                sid: "RM_1".to_string(),
                name: "standup".to_string(),
                empty_timeout: 300,
                creation_time: 1_700_000_000,
                num_participants: 2,
                ..Default::default()
            }),
            participant: Some(ParticipantInfo {
                sid: "PA_me".to_string(),
                identity: "alice".to_string(),
                state: ParticipantState::Joined.into(),
                version: 1,
                ..Default::default()
            }),
            other_participants: vec![ParticipantInfo {
                sid: "PA_bob".to_string(),
                identity: "bob".to_string(),
                state: ParticipantState::Active.into(),
                tracks: vec![TrackInfo {
                    sid: "TR_mic".to_string(),
                    track_type: TrackType::Audio.into(),
                    source: TrackSource::Microphone.into(),
                    mime_type: "audio/opus".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            server_version: "1.8.0".to_string(),
            ice_servers: vec![IceServer {
                urls: vec!["turn:turn.example.com:443".to_string()],
                username: "u".to_string(),
                credential: "c".to_string(),
            }],
            ping_timeout: 15,
            ping_interval: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_join_response_roundtrip() {
        let join = sample_join();
        let decoded = JoinResponse::decode(join.encode_to_vec().as_slice()).expect("decode");
        assert_eq!(decoded, join);
    }

    #[test]
    fn test_empty_room_presence_survives() {
        let join = JoinResponse {
            room: Some(Room::default()),
            ..Default::default()
        };
        let decoded = JoinResponse::decode(join.encode_to_vec().as_slice()).expect("decode");
        assert_eq!(decoded.room, Some(Room::default()));
        assert!(decoded.participant.is_none());
    }

    #[test]
    fn test_join_response_json() {
        let json = r#"{
            "room": {"sid": "RM_1", "name": "standup"},
            "participant": {"identity": "alice", "state": "JOINED"},
            "pingInterval": 5,
            "pingTimeout": 15
        }"#;
        let join: JoinResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(join.room.map(|r| r.name), Some("standup".to_string()));
        assert_eq!(
            join.participant.map(|p| p.state()),
            Some(ParticipantState::Joined)
        );
        assert_eq!(join.ping_interval, 5);
        assert_eq!(join.ping_timeout, 15);
    }
}
