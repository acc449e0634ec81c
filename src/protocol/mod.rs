//! Signaling protocol message types and wire codec.
//!
//! This module defines the binary request/response envelopes exchanged with
//! the signaling server and the payload structs they carry.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`OutboundRequest`] | Client → Server | Negotiation, track control, liveness |
//! | [`SignalMessage`] | Server → Client | Join, negotiation, room/participant updates |
//!
//! Each envelope is a protobuf message with a single `oneof` payload field.
//! The payload structs derive [`prost::Message`] and the envelopes
//! [`prost::Oneof`], so the byte layout is prost's. The codec is stateless and
//! safe to call from any thread.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `enums` | Wire enumerations |
//! | `rtc` | Negotiation payloads |
//! | `room` | Room, participant and track descriptions |
//! | `updates` | Server-pushed updates |
//! | `request` | Outbound envelope |
//! | `response` | Inbound envelope |

// ============================================================================
// Submodules
// ============================================================================

/// Wire enumerations.
pub mod enums;

/// Session negotiation payloads.
pub mod rtc;

/// Room, participant and track descriptions.
pub mod room;

/// Server-pushed update payloads.
pub mod updates;

/// Client → server envelope.
pub mod request;

/// Server → client envelope.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use enums::{
    ConnectionQuality, DisconnectReason, ParticipantState, RequestReason, SignalTarget,
    StreamState, SubscriptionError, TrackSource, TrackType, VideoQuality,
};
pub use request::OutboundRequest;
pub use response::SignalMessage;
pub use room::{IceServer, JoinResponse, ParticipantInfo, ReconnectResponse, Room, TrackInfo};
pub use rtc::{
    AddTrackRequest, LeaveRequest, MuteTrackRequest, ParticipantTracks, Ping, Pong,
    SessionDescription, TrickleRequest, UpdateSubscription, UpdateTrackSettings, VideoLayer,
};
pub use updates::{
    ConnectionQualityInfo, ConnectionQualityUpdate, ParticipantUpdate, RequestResponse,
    RoomUpdate, SpeakerInfo, SpeakersChanged, StreamStateInfo, StreamStateUpdate,
    SubscribedQuality, SubscribedQualityUpdate, SubscriptionPermissionUpdate,
    SubscriptionResponse, TrackPublishedResponse, TrackSubscribed, TrackUnpublishedResponse,
};
