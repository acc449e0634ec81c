//! Ping/pong liveness probing.
//!
//! [`PingPongKit`] drives two timers on the owning client's [`TaskQueue`]:
//!
//! | Timer | Armed | Cancelled |
//! |-------|-------|-----------|
//! | interval | `start` | `stop`, declined ping, pong timeout |
//! | timeout | ping sent with none outstanding | pong received, `stop` |
//!
//! The kit only reports. Sending the ping and reacting to a timeout are the
//! listener's job.
//!
//! # Deadline
//!
//! The timeout is anchored to the oldest unanswered ping. Interval ticks that
//! send further pings while one is outstanding leave it alone, unlike
//! implementations that re-arm it on every tick. A server that goes silent
//! is therefore detected `ping_timeout` after the first missed pong, not
//! after the last ping.
//!
//! # Stale Fires
//!
//! A timer can fire after it was cancelled if its task was already queued.
//! Every fire carries the epoch it was armed in and is ignored when the epoch
//! has moved on.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::runtime::{DelayedTask, TaskQueue};

// ============================================================================
// PingPongKitListener
// ============================================================================

/// Receives liveness decisions from a [`PingPongKit`].
pub trait PingPongKitListener: Send + Sync {
    /// Sends a ping; returns `false` to decline, which stops probing until the
    /// next [`PingPongKit::start`].
    fn on_ping_requested(&self) -> bool;

    /// No pong arrived in time. Probing has already stopped.
    fn on_pong_timeout(&self);
}

// ============================================================================
// KitState
// ============================================================================

struct KitState {
    /// Listener of the current run.
    listener: Option<Weak<dyn PingPongKitListener>>,
    /// Repeating ping timer.
    interval: Option<DelayedTask>,
    /// Pong deadline of the oldest unanswered ping.
    timeout: Option<DelayedTask>,
    /// Bumped on every start and stop.
    run_epoch: u64,
    /// Bumped whenever the deadline is armed or cleared.
    timeout_epoch: u64,
    ping_interval: Duration,
    ping_timeout: Duration,
}

impl KitState {
    fn clear_timeout(&mut self) {
        self.timeout = None;
        self.timeout_epoch += 1;
    }

    fn halt(&mut self) {
        self.interval = None;
        self.clear_timeout();
        self.run_epoch += 1;
    }
}

// ============================================================================
// KitInner
// ============================================================================

struct KitInner {
    queue: TaskQueue,
    state: Mutex<KitState>,
}

impl KitInner {
    fn on_interval_tick(self: &Arc<Self>, run_epoch: u64) {
        let listener = {
            let mut state = self.state.lock();
            if state.run_epoch != run_epoch || state.interval.is_none() {
                return;
            }
            match state.listener.as_ref().and_then(Weak::upgrade) {
                Some(listener) => listener,
                None => {
                    debug!(queue = self.queue.name(), "Ping listener gone, stopping");
                    state.halt();
                    return;
                }
            }
        };

        // No lock while user code runs
        let accepted = listener.on_ping_requested();

        let mut state = self.state.lock();
        if state.run_epoch != run_epoch {
            return;
        }

        if !accepted {
            debug!(queue = self.queue.name(), "Ping declined, probing stopped");
            state.halt();
            return;
        }

        trace!(queue = self.queue.name(), "Ping sent");

        // Not re-armed while a ping is outstanding; see "Deadline" above
        if state.ping_timeout.is_zero() || state.timeout.is_some() {
            return;
        }

        state.timeout_epoch += 1;
        let timeout_epoch = state.timeout_epoch;
        let weak = Arc::downgrade(self);
        let delay = state.ping_timeout;
        state.timeout = Some(self.queue.post_delayed_task(delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_timeout(run_epoch, timeout_epoch);
            }
        }));
    }

    fn on_timeout(&self, run_epoch: u64, timeout_epoch: u64) {
        let (listener, waited) = {
            let mut state = self.state.lock();
            if state.run_epoch != run_epoch
                || state.timeout_epoch != timeout_epoch
                || state.timeout.is_none()
            {
                return;
            }
            let waited = state.ping_timeout;
            let listener = state.listener.as_ref().and_then(Weak::upgrade);
            state.halt();
            (listener, waited)
        };

        warn!(
            queue = self.queue.name(),
            timeout_ms = waited.as_millis() as u64,
            "Pong timeout"
        );

        if let Some(listener) = listener {
            listener.on_pong_timeout();
        }
    }
}

// ============================================================================
// PingPongKit
// ============================================================================

/// Periodic ping scheduler with a pong deadline.
///
/// Methods are safe to call from any thread; timer callbacks run on the
/// queue given at construction. Dropping the kit cancels both timers.
pub struct PingPongKit {
    inner: Arc<KitInner>,
}

impl PingPongKit {
    /// Creates a stopped kit. A zero interval disables pinging, a zero timeout
    /// disables the deadline.
    #[must_use]
    pub fn new(queue: TaskQueue, ping_interval: Duration, ping_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(KitInner {
                queue,
                state: Mutex::new(KitState {
                    listener: None,
                    interval: None,
                    timeout: None,
                    run_epoch: 0,
                    timeout_epoch: 0,
                    ping_interval,
                    ping_timeout,
                }),
            }),
        }
    }

    /// Starts probing; returns `false` if already running or pinging is
    /// disabled.
    pub fn start(&self, listener: Weak<dyn PingPongKitListener>) -> bool {
        let mut state = self.inner.state.lock();

        if state.interval.is_some() || state.ping_interval.is_zero() {
            return false;
        }

        state.listener = Some(listener);
        self.arm_interval(&mut state);

        debug!(
            queue = self.inner.queue.name(),
            interval_ms = state.ping_interval.as_millis() as u64,
            timeout_ms = state.ping_timeout.as_millis() as u64,
            "Ping/pong started"
        );
        true
    }

    /// Stops both timers. Idempotent.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if state.interval.is_some() || state.timeout.is_some() {
            debug!(queue = self.inner.queue.name(), "Ping/pong stopped");
        }
        state.halt();
    }

    /// Confirms liveness by clearing the pending pong deadline.
    pub fn notify_that_pong_received(&self) {
        let mut state = self.inner.state.lock();
        if state.timeout.is_some() {
            trace!(queue = self.inner.queue.name(), "Pong deadline cleared");
        }
        state.clear_timeout();
    }

    /// Replaces interval and timeout. A running kit restarts with the new
    /// values; a zero interval leaves it stopped.
    pub fn set_intervals(&self, ping_interval: Duration, ping_timeout: Duration) {
        let mut state = self.inner.state.lock();
        let was_running = state.interval.is_some();

        state.ping_interval = ping_interval;
        state.ping_timeout = ping_timeout;

        if was_running {
            state.halt();
            if !ping_interval.is_zero() {
                self.arm_interval(&mut state);
            }
        }

        debug!(
            queue = self.inner.queue.name(),
            interval_ms = ping_interval.as_millis() as u64,
            timeout_ms = ping_timeout.as_millis() as u64,
            restarted = was_running,
            "Ping/pong reconfigured"
        );
    }

    /// Returns `true` while the interval timer is armed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().interval.is_some()
    }

    /// Returns `true` while a ping awaits its pong.
    #[must_use]
    pub fn is_awaiting_pong(&self) -> bool {
        self.inner.state.lock().timeout.is_some()
    }

    /// Returns the configured interval and timeout.
    #[must_use]
    pub fn intervals(&self) -> (Duration, Duration) {
        let state = self.inner.state.lock();
        (state.ping_interval, state.ping_timeout)
    }

    fn arm_interval(&self, state: &mut KitState) {
        state.run_epoch += 1;
        state.clear_timeout();

        let run_epoch = state.run_epoch;
        let weak = Arc::downgrade(&self.inner);
        state.interval = Some(
            self.inner
                .queue
                .post_repeating_task(state.ping_interval, move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_interval_tick(run_epoch);
                    }
                }),
        );
    }
}

impl Drop for PingPongKit {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================
