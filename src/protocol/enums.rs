//! Enumerations shared by signaling payloads.
//!
//! All enums are proto3 enums: the zero value is the default and unknown
//! integers received from a newer server collapse to it. Payload structs
//! store them as raw `i32` fields; prost generates a typed getter and setter
//! per field (`track.track_type()`, `track.set_track_type(..)`).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Macro
// ============================================================================

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(#[$first_meta:meta])* $first:ident = 0
            $(, $(#[$variant_meta:meta])* $variant:ident = $value:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::prost::Enumeration, Serialize, Deserialize,
        )]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[repr(i32)]
        pub enum $name {
            $(#[$first_meta])*
            $first = 0,
            $($(#[$variant_meta])* $variant = $value,)*
        }

        impl $name {
            /// Maps a wire value to the enum, falling back to the zero value.
            #[inline]
            #[must_use]
            pub fn from_wire(value: i32) -> Self {
                Self::try_from(value).unwrap_or_default()
            }
        }
    };
}

// ============================================================================
// JSON Adapters
// ============================================================================

/// Serde adapters for `i32` fields that hold a wire enum.
///
/// JSON frames carry enum names (`"SCREEN_SHARE"`), the binary codec carries
/// the integer. Used as
/// `#[serde(serialize_with = "json_enum::serialize::<TrackType, _>", ...)]`.
pub(crate) mod json_enum {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Writes the enum name; unknown integers are written as the zero value.
    pub(crate) fn serialize<E, S>(value: &i32, serializer: S) -> Result<S::Ok, S::Error>
    where
        E: TryFrom<i32> + Default + Serialize,
        S: Serializer,
    {
        E::try_from(*value).unwrap_or_default().serialize(serializer)
    }

    /// Reads an enum name into its wire value.
    pub(crate) fn deserialize<'de, E, D>(deserializer: D) -> Result<i32, D::Error>
    where
        E: Into<i32> + Deserialize<'de>,
        D: Deserializer<'de>,
    {
        E::deserialize(deserializer).map(Into::into)
    }
}

// ============================================================================
// Track Enums
// ============================================================================

wire_enum! {
    /// Media kind of a track.
    TrackType {
        Audio = 0,
        Video = 1,
        Data = 2,
    }
}

wire_enum! {
    /// Capture source of a track.
    TrackSource {
        Unknown = 0,
        Camera = 1,
        Microphone = 2,
        ScreenShare = 3,
        ScreenShareAudio = 4,
    }
}

wire_enum! {
    /// Simulcast layer quality.
    VideoQuality {
        Low = 0,
        Medium = 1,
        High = 2,
        Off = 3,
    }
}

wire_enum! {
    /// Which peer connection a trickle candidate belongs to.
    SignalTarget {
        Publisher = 0,
        Subscriber = 1,
    }
}

// ============================================================================
// Participant Enums
// ============================================================================

wire_enum! {
    /// Participant life-cycle as reported by the server.
    ParticipantState {
        Joining = 0,
        Joined = 1,
        Active = 2,
        Disconnected = 3,
    }
}

wire_enum! {
    /// Server's estimate of a participant's link quality.
    ConnectionQuality {
        Poor = 0,
        Good = 1,
        Excellent = 2,
        Lost = 3,
    }
}

wire_enum! {
    /// Whether a subscribed stream is currently flowing.
    StreamState {
        Active = 0,
        Paused = 1,
    }
}

// ============================================================================
// Outcome Enums
// ============================================================================

wire_enum! {
    /// Why a participant left or was removed.
    DisconnectReason {
        UnknownReason = 0,
        ClientInitiated = 1,
        DuplicateIdentity = 2,
        ServerShutdown = 3,
        ParticipantRemoved = 4,
        RoomDeleted = 5,
        StateMismatch = 6,
        JoinFailure = 7,
        Migration = 8,
        SignalClose = 9,
        RoomClosed = 10,
    }
}

wire_enum! {
    /// Outcome of a client request the server acknowledged.
    RequestReason {
        Ok = 0,
        NotFound = 1,
        NotAllowed = 2,
        LimitExceeded = 3,
    }
}

wire_enum! {
    /// Why a subscription could not be established.
    SubscriptionError {
        SeUnknown = 0,
        SeCodecUnsupported = 1,
        SeTrackNotfound = 2,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_known() {
        assert_eq!(TrackSource::from_wire(3), TrackSource::ScreenShare);
        assert_eq!(ConnectionQuality::from_wire(2), ConnectionQuality::Excellent);
        assert_eq!(i32::from(DisconnectReason::RoomClosed), 10);
    }

    #[test]
    fn test_from_wire_unknown_falls_back() {
        assert_eq!(TrackType::from_wire(42), TrackType::Audio);
        assert_eq!(VideoQuality::from_wire(-1), VideoQuality::Low);
        assert!(!StreamState::is_valid(7));
    }

    #[test]
    fn test_json_names() {
        let json = serde_json::to_string(&TrackSource::ScreenShareAudio).expect("serialize");
        assert_eq!(json, "\"SCREEN_SHARE_AUDIO\"");

        let reason: DisconnectReason =
            serde_json::from_str("\"CLIENT_INITIATED\"").expect("parse");
        assert_eq!(reason, DisconnectReason::ClientInitiated);
    }
}
