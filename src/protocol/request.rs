//! Client → server envelope.
//!
//! [`OutboundRequest`] mirrors the `oneof message` of the server's
//! `SignalRequest`. Encoding is total: every well-typed request produces a
//! buffer.

// ============================================================================
// Imports
// ============================================================================

use bytes::{Bytes, BytesMut};
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

use super::rtc::{
    AddTrackRequest, LeaveRequest, MuteTrackRequest, Ping, SessionDescription, TrickleRequest,
    UpdateSubscription, UpdateTrackSettings,
};

// ============================================================================
// OutboundRequest
// ============================================================================

/// A request the client sends to the signaling server.
#[derive(Clone, PartialEq, Eq, ::prost::Oneof, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutboundRequest {
    /// Publisher offer.
    #[prost(message, tag = "1")]
    Offer(SessionDescription),
    /// Subscriber answer.
    #[prost(message, tag = "2")]
    Answer(SessionDescription),
    /// ICE candidate for either peer connection.
    #[prost(message, tag = "3")]
    Trickle(TrickleRequest),
    /// Announce a local track.
    #[prost(message, tag = "4")]
    AddTrack(AddTrackRequest),
    /// Mute or unmute a local track.
    #[prost(message, tag = "5")]
    Mute(MuteTrackRequest),
    /// Change remote track subscriptions.
    #[prost(message, tag = "6")]
    Subscription(UpdateSubscription),
    /// Change receive preferences of subscribed tracks.
    #[prost(message, tag = "7")]
    TrackSetting(UpdateTrackSettings),
    /// Leave the room.
    #[prost(message, tag = "8")]
    Leave(LeaveRequest),
    /// Old-style ping carrying only a timestamp.
    #[prost(int64, tag = "14")]
    #[serde(rename = "ping")]
    LegacyPing(i64),
    /// Ping carrying timestamp and last round-trip time.
    #[prost(message, tag = "16")]
    #[serde(rename = "pingReq")]
    Ping(Ping),
}

/// The `SignalRequest` envelope: a single `oneof message` field.
#[derive(Clone, PartialEq, ::prost::Message)]
struct SignalRequest {
    #[prost(oneof = "OutboundRequest", tags = "1, 2, 3, 4, 5, 6, 7, 8, 14, 16")]
    message: Option<OutboundRequest>,
}

impl OutboundRequest {
    /// Short name of the request kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::Trickle(_) => "trickle",
            Self::AddTrack(_) => "add_track",
            Self::Mute(_) => "mute",
            Self::Subscription(_) => "subscription",
            Self::TrackSetting(_) => "track_setting",
            Self::Leave(_) => "leave",
            Self::LegacyPing(_) => "ping",
            Self::Ping(_) => "ping_req",
        }
    }

    /// Encodes the request envelope.
    ///
    /// The envelope holds nothing but the oneof, so its bytes are the
    /// member's bytes. Members are written even when their payload is empty.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decodes a request envelope; `None` when no known request is present.
    ///
    /// Used by server-side tooling and tests; the client never receives
    /// requests.
    pub fn decode(buf: &[u8]) -> Result<Option<Self>, DecodeError> {
        Ok(SignalRequest::decode(buf)?.message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::enums::{DisconnectReason, SignalTarget};

    #[test]
    fn test_offer_envelope_bytes() {
        let request = OutboundRequest::Offer(SessionDescription::offer("v=0"));
        let bytes = request.to_bytes();
        // field 1, length-delimited
        assert_eq!(bytes[0], 0x0a);
        assert_eq!(
            OutboundRequest::decode(&bytes).expect("decode"),
            Some(request)
        );
    }

    #[test]
    fn test_empty_payload_keeps_discriminant() {
        let request = OutboundRequest::Leave(LeaveRequest::default());
        let bytes = request.to_bytes();
        assert_eq!(&bytes[..], &[0x42, 0x00]);
        assert_eq!(
            OutboundRequest::decode(&bytes).expect("decode"),
            Some(request)
        );
    }

    #[test]
    fn test_legacy_ping_zero_is_written() {
        let bytes = OutboundRequest::LegacyPing(0).to_bytes();
        assert_eq!(&bytes[..], &[0x70, 0x00]);
    }

    #[test]
    fn test_trickle_and_leave_roundtrip() {
        let requests = [
            OutboundRequest::Trickle(TrickleRequest {
                candidate_init: r#"{"candidate":"candidate:1 1 udp 2122260223 10.0.0.2 54321 typ host"}"#
                    .to_string(),
                target: SignalTarget::Subscriber.into(),
                is_final: false,
            }),
            OutboundRequest::Leave(LeaveRequest {
                can_reconnect: false,
                reason: DisconnectReason::ClientInitiated.into(),
            }),
            OutboundRequest::Ping(Ping {
                timestamp: 1_700_000_000_123,
                rtt: 42,
            }),
        ];

        for request in requests {
            let decoded = OutboundRequest::decode(&request.to_bytes()).expect("decode");
            assert_eq!(decoded, Some(request));
        }
    }

    #[test]
    fn test_decode_empty_is_none() {
        assert_eq!(OutboundRequest::decode(&[]).expect("decode"), None);
    }

    #[test]
    fn test_last_member_on_the_wire_wins() {
        let mut bytes = OutboundRequest::LegacyPing(5).to_bytes().to_vec();
        bytes.extend_from_slice(&OutboundRequest::Leave(LeaveRequest::default()).to_bytes());

        assert_eq!(
            OutboundRequest::decode(&bytes).expect("decode"),
            Some(OutboundRequest::Leave(LeaveRequest::default()))
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&OutboundRequest::Mute(MuteTrackRequest {
            sid: "TR_a".to_string(),
            muted: true,
        }))
        .expect("serialize");
        assert_eq!(json, r#"{"mute":{"sid":"TR_a","muted":true}}"#);
    }
}
