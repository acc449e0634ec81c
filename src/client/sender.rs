//! Typed outbound requests.
//!
//! Each `send_*` method wraps its payload in an [`OutboundRequest`], encodes
//! it and hands the bytes to the transport. The returned flag says whether the
//! transport accepted the write, nothing more. There is no retry.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::Error;
use crate::identifiers::SignalClientId;
use crate::protocol::{
    AddTrackRequest, LeaveRequest, MuteTrackRequest, OutboundRequest, Ping, SessionDescription,
    TrickleRequest, UpdateSubscription, UpdateTrackSettings,
};
use crate::transport::DuplexTransport;

// ============================================================================
// RequestSender
// ============================================================================

/// Encodes requests onto a transport.
#[derive(Clone)]
pub struct RequestSender {
    client_id: SignalClientId,
    transport: Arc<dyn DuplexTransport>,
}

impl RequestSender {
    /// Creates a sender writing to `transport`.
    #[must_use]
    pub fn new(client_id: SignalClientId, transport: Arc<dyn DuplexTransport>) -> Self {
        Self {
            client_id,
            transport,
        }
    }

    /// Encodes and writes any request.
    pub fn send(&self, request: OutboundRequest) -> bool {
        let kind = request.kind();
        let data = request.to_bytes();
        let bytes = data.len();

        if self.transport.send(data) {
            trace!(client_id = %self.client_id, kind, bytes, "Request sent");
            true
        } else {
            let err = Error::send_failed(kind);
            warn!(client_id = %self.client_id, error = %err, bytes, "Transport rejected request");
            false
        }
    }

    /// Sends the publisher offer.
    #[inline]
    pub fn send_offer(&self, offer: SessionDescription) -> bool {
        self.send(OutboundRequest::Offer(offer))
    }

    /// Sends the subscriber answer.
    #[inline]
    pub fn send_answer(&self, answer: SessionDescription) -> bool {
        self.send(OutboundRequest::Answer(answer))
    }

    /// Sends a local ICE candidate.
    #[inline]
    pub fn send_trickle(&self, trickle: TrickleRequest) -> bool {
        self.send(OutboundRequest::Trickle(trickle))
    }

    /// Announces a local track.
    #[inline]
    pub fn send_add_track(&self, add_track: AddTrackRequest) -> bool {
        self.send(OutboundRequest::AddTrack(add_track))
    }

    /// Mutes or unmutes a local track.
    #[inline]
    pub fn send_mute_track(&self, mute: MuteTrackRequest) -> bool {
        self.send(OutboundRequest::Mute(mute))
    }

    /// Changes remote track subscriptions.
    #[inline]
    pub fn send_subscription(&self, subscription: UpdateSubscription) -> bool {
        self.send(OutboundRequest::Subscription(subscription))
    }

    /// Changes receive settings of subscribed tracks.
    #[inline]
    pub fn send_track_settings(&self, settings: UpdateTrackSettings) -> bool {
        self.send(OutboundRequest::TrackSetting(settings))
    }

    /// Sends a liveness ping.
    #[inline]
    pub fn send_ping(&self, ping: Ping) -> bool {
        self.send(OutboundRequest::Ping(ping))
    }

    /// Tells the server the client is leaving.
    #[inline]
    pub fn send_leave(&self, leave: LeaveRequest) -> bool {
        self.send(OutboundRequest::Leave(leave))
    }
}

// ============================================================================
// Tests
// ============================================================================
