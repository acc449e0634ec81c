//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Scope |
//! |------|-------|
//! | [`SignalClientId`] | One per [`SignalClient`](crate::SignalClient) instance, process-wide unique |
//! | [`ListenerId`] | One per listener registration |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Counters
// ============================================================================

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// SignalClientId
// ============================================================================

/// Opaque handle identifying a signal client.
///
/// Passed to every listener callback so one listener can serve several
/// concurrently open clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalClientId(u64);

impl SignalClientId {
    /// Allocates a new process-unique identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignalClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Handle returned when registering a listener; used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocates a new process-unique identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_are_unique() {
        let a = SignalClientId::generate();
        let b = SignalClientId::generate();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_listener_id_display() {
        let id = ListenerId::generate();
        assert!(id.to_string().starts_with("listener-"));
    }
}
