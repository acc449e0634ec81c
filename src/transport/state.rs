//! Connection state and the transition table.
//!
//! # Transitions
//!
//! | From | Allowed targets |
//! |------|-----------------|
//! | `Disconnected` | `Connecting`, `Connected` |
//! | `Connecting` | any |
//! | `Connected` | `Disconnecting`, `Disconnected` |
//! | `Disconnecting` | `Disconnected` |
//!
//! A request for the current state is accepted without notifying anyone.
//!
//! # Notification Order
//!
//! Accepted transitions are queued and delivered one at a time by whichever
//! caller currently owns delivery. The observable state only moves when its
//! notification goes out, so a listener reading [`TransportStateMachine::state`]
//! from inside a callback sees the state it is being told about. A transition
//! requested from inside a callback is validated against
//! [`TransportStateMachine::target_state`] right away and applied once the
//! current fan-out has reached every listener.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::listener::{ListenerSet, SignalTransportListener};
use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, SignalClientId};

// ============================================================================
// ConnectionState
// ============================================================================

/// Connection state of a signaling client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No transport is open.
    #[default]
    Disconnected,
    /// Transport open requested, not yet confirmed.
    Connecting,
    /// Transport open.
    Connected,
    /// Orderly shutdown in progress.
    Disconnecting,
}

impl ConnectionState {
    /// Returns `true` if moving from `self` to `next` is allowed.
    ///
    /// Staying in the same state is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Connecting, _) => true,
            (Self::Connected, Self::Connected | Self::Disconnecting | Self::Disconnected) => true,
            (Self::Disconnecting, Self::Disconnecting | Self::Disconnected) => true,
            (Self::Disconnected, Self::Disconnected | Self::Connecting | Self::Connected) => true,
            _ => false,
        }
    }

    /// Returns the lowercase state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }

    /// Returns `true` for [`ConnectionState::Connected`].
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Notification
// ============================================================================

/// Queued listener notification.
enum Notification {
    StateChanged(ConnectionState),
    Error(String),
}

/// Accepted work not yet delivered.
struct Schedule {
    /// State once every queued transition is applied.
    target: ConnectionState,
    /// Notifications in acceptance order.
    pending: VecDeque<Notification>,
    /// Set while some caller is draining `pending`.
    delivering: bool,
}

// ============================================================================
// TransportStateMachine
// ============================================================================

/// Guards the connection state and fans out changes to transport listeners.
pub struct TransportStateMachine {
    /// Client reported in callbacks.
    client_id: SignalClientId,
    /// State of the notification delivered last (or being delivered).
    state: RwLock<ConnectionState>,
    /// Registered listeners.
    listeners: ListenerSet<dyn SignalTransportListener>,
    /// Accepted transitions and errors awaiting delivery.
    schedule: Mutex<Schedule>,
}

impl TransportStateMachine {
    /// Creates a machine in [`ConnectionState::Disconnected`].
    #[must_use]
    pub fn new(client_id: SignalClientId) -> Self {
        Self {
            client_id,
            state: RwLock::new(ConnectionState::Disconnected),
            listeners: ListenerSet::new(),
            schedule: Mutex::new(Schedule {
                target: ConnectionState::Disconnected,
                pending: VecDeque::new(),
                delivering: false,
            }),
        }
    }

    /// Returns the current state.
    ///
    /// Inside a listener callback this is the state being delivered, even if
    /// a later transition has already been accepted.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Returns the state after every accepted transition is delivered.
    ///
    /// Equals [`state`](Self::state) except while a fan-out is in progress.
    #[must_use]
    pub fn target_state(&self) -> ConnectionState {
        self.schedule.lock().target
    }

    /// Moves to `next`; returns `false` when the table forbids it.
    ///
    /// Listeners hear about every accepted change exactly once. Requesting the
    /// target state returns `true` and notifies no one.
    pub fn transition(&self, next: ConnectionState) -> bool {
        self.try_transition(next).is_ok()
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] when the table forbids moving from the
    /// target state; nothing is queued.
    pub fn try_transition(&self, next: ConnectionState) -> Result<()> {
        {
            let mut schedule = self.schedule.lock();
            let current = schedule.target;

            if current == next {
                return Ok(());
            }

            if !current.can_transition_to(next) {
                warn!(
                    client_id = %self.client_id,
                    from = %current,
                    to = %next,
                    "Rejected transport state transition"
                );
                return Err(Error::invalid_transition(current, next));
            }

            schedule.target = next;
            schedule
                .pending
                .push_back(Notification::StateChanged(next));

            debug!(
                client_id = %self.client_id,
                from = %current,
                to = %next,
                "Transport state changed"
            );
        }

        self.flush_notifications();
        Ok(())
    }

    /// Reports a transport failure to every listener.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.schedule
            .lock()
            .pending
            .push_back(Notification::Error(message.into()));
        self.flush_notifications();
    }

    /// Registers a transport listener.
    pub fn add_listener(&self, listener: Arc<dyn SignalTransportListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregisters a transport listener; returns `false` if unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Unregisters every listener.
    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    /// Delivers queued notifications unless another caller already is.
    ///
    /// A state change becomes visible through `state()` just before its
    /// fan-out starts.
    fn flush_notifications(&self) {
        {
            let mut schedule = self.schedule.lock();
            if schedule.delivering {
                return;
            }
            schedule.delivering = true;
        }

        loop {
            let notification = {
                let mut schedule = self.schedule.lock();
                let Some(notification) = schedule.pending.pop_front() else {
                    schedule.delivering = false;
                    return;
                };
                if let Notification::StateChanged(state) = &notification {
                    *self.state.write() = *state;
                }
                notification
            };
            self.deliver(&notification);
        }
    }

    fn deliver(&self, notification: &Notification) {
        let client_id = self.client_id;
        match notification {
            Notification::StateChanged(state) => self
                .listeners
                .for_each(|l| l.on_transport_state_changed(client_id, *state)),
            Notification::Error(message) => self
                .listeners
                .for_each(|l| l.on_transport_error(client_id, message)),
        }
    }
}

impl fmt::Debug for TransportStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportStateMachine")
            .field("client_id", &self.client_id)
            .field("state", &self.state())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Weak;

    use ConnectionState::{Connected, Connecting, Disconnected, Disconnecting};

    const ALL: [ConnectionState; 4] = [Disconnected, Connecting, Connected, Disconnecting];

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SignalTransportListener for Recorder {
        fn on_transport_state_changed(&self, _client_id: SignalClientId, state: ConnectionState) {
            self.events.lock().push(state.to_string());
        }

        fn on_transport_error(&self, _client_id: SignalClientId, message: &str) {
            self.events.lock().push(format!("error:{message}"));
        }
    }

    /// Requests `Disconnected` from inside the `Disconnecting` notification.
    struct Chained {
        machine: Mutex<Weak<TransportStateMachine>>,
        events: Mutex<Vec<ConnectionState>>,
    }

    impl SignalTransportListener for Chained {
        fn on_transport_state_changed(&self, _client_id: SignalClientId, state: ConnectionState) {
            self.events.lock().push(state);
            if state == Disconnecting {
                let machine = self.machine.lock().upgrade();
                if let Some(machine) = machine {
                    assert!(machine.transition(Disconnected));
                }
            }
        }

        fn on_transport_error(&self, _client_id: SignalClientId, _message: &str) {}
    }

    fn machine_in(state: ConnectionState) -> TransportStateMachine {
        let machine = TransportStateMachine::new(SignalClientId::generate());
        match state {
            Disconnected => {}
            Connecting => assert!(machine.transition(Connecting)),
            Connected => assert!(machine.transition(Connected)),
            Disconnecting => {
                assert!(machine.transition(Connected));
                assert!(machine.transition(Disconnecting));
            }
        }
        machine
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(Disconnecting.to_string(), "disconnecting");
        assert_eq!(
            serde_json::to_string(&Connected).expect("serialize"),
            r#""connected""#
        );
    }

    #[test]
    fn test_transition_matrix() {
        let expected = |from: ConnectionState, to: ConnectionState| -> bool {
            from == to
                || matches!(
                    (from, to),
                    (Connecting, _)
                        | (Connected, Disconnecting | Disconnected)
                        | (Disconnecting, Disconnected)
                        | (Disconnected, Connecting | Connected)
                )
        };

        for from in ALL {
            for to in ALL {
                let machine = machine_in(from);
                let accepted = machine.transition(to);
                assert_eq!(accepted, expected(from, to), "{from} -> {to}");
                let after = if accepted { to } else { from };
                assert_eq!(machine.state(), after, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_connecting_accepts_disconnecting() {
        // Connecting is permissive: an abort before open goes straight to
        // Disconnecting.
        let machine = machine_in(Connecting);
        assert!(machine.transition(Disconnecting));
        assert_eq!(machine.state(), Disconnecting);
    }

    #[test]
    fn test_try_transition_error() {
        let machine = machine_in(Disconnecting);
        let err = machine.try_transition(Connecting).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: Disconnecting,
                to: Connecting
            }
        ));
        assert_eq!(machine.state(), Disconnecting);
    }

    #[test]
    fn test_same_state_does_not_notify() {
        let machine = TransportStateMachine::new(SignalClientId::generate());
        let recorder = Arc::new(Recorder::default());
        machine.add_listener(recorder.clone());

        assert!(machine.transition(Connecting));
        assert!(machine.transition(Connecting));
        assert!(machine.transition(Connected));
        assert!(machine.transition(Connected));

        assert_eq!(*recorder.events.lock(), vec!["connecting", "connected"]);
    }

    #[test]
    fn test_rejected_transition_does_not_notify() {
        let machine = machine_in(Connected);
        let recorder = Arc::new(Recorder::default());
        machine.add_listener(recorder.clone());

        assert!(!machine.transition(Connecting));
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn test_reentrant_transition_is_ordered() {
        let machine = Arc::new(machine_in(Connected));
        let chained = Arc::new(Chained {
            machine: Mutex::new(Weak::new()),
            events: Mutex::new(Vec::new()),
        });
        *chained.machine.lock() = Arc::downgrade(&machine);
        let recorder = Arc::new(Recorder::default());

        machine.add_listener(chained.clone());
        machine.add_listener(recorder.clone());

        assert!(machine.transition(Disconnecting));

        assert_eq!(machine.state(), Disconnected);
        assert_eq!(*chained.events.lock(), vec![Disconnecting, Disconnected]);
        assert_eq!(
            *recorder.events.lock(),
            vec!["disconnecting", "disconnected"]
        );
    }

    /// Leaves `Connected` from inside its own notification.
    struct Bouncer {
        machine: Mutex<Weak<TransportStateMachine>>,
        seen: Mutex<Vec<(ConnectionState, ConnectionState, ConnectionState)>>,
    }

    impl SignalTransportListener for Bouncer {
        fn on_transport_state_changed(&self, _client_id: SignalClientId, state: ConnectionState) {
            let Some(machine) = self.machine.lock().upgrade() else {
                return;
            };
            if state == Connected {
                assert!(machine.transition(Disconnected));
            }
            self.seen
                .lock()
                .push((state, machine.state(), machine.target_state()));
        }

        fn on_transport_error(&self, _client_id: SignalClientId, _message: &str) {}
    }

    /// Records what it was told next to what `state()` returned at the time.
    struct Reader {
        machine: Mutex<Weak<TransportStateMachine>>,
        seen: Mutex<Vec<(ConnectionState, ConnectionState)>>,
    }

    impl SignalTransportListener for Reader {
        fn on_transport_state_changed(&self, _client_id: SignalClientId, state: ConnectionState) {
            if let Some(machine) = self.machine.lock().upgrade() {
                self.seen.lock().push((state, machine.state()));
            }
        }

        fn on_transport_error(&self, _client_id: SignalClientId, _message: &str) {}
    }

    #[test]
    fn test_state_read_in_callback_matches_notification() {
        let machine = Arc::new(machine_in(Connecting));
        let bouncer = Arc::new(Bouncer {
            machine: Mutex::new(Arc::downgrade(&machine)),
            seen: Mutex::new(Vec::new()),
        });
        let reader = Arc::new(Reader {
            machine: Mutex::new(Arc::downgrade(&machine)),
            seen: Mutex::new(Vec::new()),
        });
        machine.add_listener(bouncer.clone());
        machine.add_listener(reader.clone());

        assert!(machine.transition(Connected));

        // Listener order is unspecified; either way the reader must never see
        // a state ahead of the one it is told about.
        assert_eq!(
            *reader.seen.lock(),
            vec![(Connected, Connected), (Disconnected, Disconnected)]
        );
        assert_eq!(
            *bouncer.seen.lock(),
            vec![
                (Connected, Connected, Disconnected),
                (Disconnected, Disconnected, Disconnected)
            ]
        );
        assert_eq!(machine.state(), Disconnected);
    }

    #[test]
    fn test_reentrant_request_validates_against_target() {
        let machine = Arc::new(machine_in(Connected));
        let machine_ref = Arc::downgrade(&machine);
        let verdicts = Arc::new(Mutex::new(Vec::new()));

        struct Requeuer {
            machine: Weak<TransportStateMachine>,
            verdicts: Arc<Mutex<Vec<bool>>>,
        }

        impl SignalTransportListener for Requeuer {
            fn on_transport_state_changed(&self, _id: SignalClientId, state: ConnectionState) {
                let Some(machine) = self.machine.upgrade() else {
                    return;
                };
                if state == Disconnecting {
                    // Disconnected is queued, so Connecting is legal from the target
                    self.verdicts.lock().push(machine.transition(Disconnected));
                    self.verdicts.lock().push(machine.transition(Connecting));
                }
            }

            fn on_transport_error(&self, _id: SignalClientId, _message: &str) {}
        }

        machine.add_listener(Arc::new(Requeuer {
            machine: machine_ref,
            verdicts: Arc::clone(&verdicts),
        }));

        assert!(machine.transition(Disconnecting));

        assert_eq!(*verdicts.lock(), vec![true, true]);
        assert_eq!(machine.state(), Connecting);
    }

    #[test]
    fn test_notify_error_and_remove_listener() {
        let machine = TransportStateMachine::new(SignalClientId::generate());
        let recorder = Arc::new(Recorder::default());
        let id = machine.add_listener(recorder.clone());

        machine.notify_error("connection reset");
        assert!(machine.remove_listener(id));
        machine.notify_error("ignored");
        assert!(machine.transition(Connecting));

        assert_eq!(*recorder.events.lock(), vec!["error:connection reset"]);
    }
}
