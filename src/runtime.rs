//! Serial task queue on tokio.
//!
//! Every [`SignalClient`](crate::SignalClient) owns one [`TaskQueue`]. All of
//! its state mutation, dispatch and timer callbacks run as tasks on that queue,
//! one at a time, in post order. Cross-thread entry points marshal onto it by
//! posting closures that capture only weak references.
//!
//! # Architecture
//!
//! ```text
//! post_task ──────────────┐
//!                         ▼
//! post_delayed_task ─► [timer task] ─► mpsc ─► [worker task] ─► run closure
//!                         ▲
//! post_repeating_task ────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, trace};

// ============================================================================
// Types
// ============================================================================

/// A unit of work executed on the queue.
type Task = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// TaskQueue
// ============================================================================

/// Handle to a single-consumer task queue.
///
/// Cloning the handle is cheap; the worker exits once every handle (and every
/// pending timer) is gone. Every method may be called from any thread, inside
/// a runtime or not: timers are spawned on the runtime the queue was created
/// on.
#[derive(Clone)]
pub struct TaskQueue {
    /// Name used in logs.
    name: Arc<str>,
    /// Channel feeding the worker.
    task_tx: mpsc::UnboundedSender<Task>,
    /// Runtime owning the worker and the timers.
    runtime: Handle,
}

impl TaskQueue {
    /// Creates a queue and spawns its worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`tokio::runtime::Handle::try_current`] first when unsure.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let runtime = Handle::current();
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        runtime.spawn(Self::run_worker(Arc::clone(&name), task_rx));

        Self {
            name,
            task_tx,
            runtime,
        }
    }

    /// Returns the queue name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Posts a task; returns `false` if the worker has shut down.
    pub fn post_task(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.task_tx.send(Box::new(task)).is_ok()
    }

    /// Posts `task` after `delay`.
    ///
    /// The returned handle cancels the timer when cancelled or dropped. A task
    /// already handed to the queue still runs; owners guard against that.
    pub fn post_delayed_task(
        &self,
        delay: Duration,
        task: impl FnOnce() + Send + 'static,
    ) -> DelayedTask {
        let task_tx = self.task_tx.clone();

        let handle = self.runtime.spawn(async move {
            sleep(delay).await;
            let _ = task_tx.send(Box::new(task));
        });

        DelayedTask { handle }
    }

    /// Posts `task` every `period`, first after one full period.
    pub fn post_repeating_task(
        &self,
        period: Duration,
        task: impl Fn() + Send + Sync + 'static,
    ) -> DelayedTask {
        let task_tx = self.task_tx.clone();
        let task = Arc::new(task);

        let handle = self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let task = Arc::clone(&task);
                if task_tx.send(Box::new(move || task())).is_err() {
                    break;
                }
            }
        });

        DelayedTask { handle }
    }

    /// Drains the channel until every sender is dropped.
    async fn run_worker(name: Arc<str>, mut task_rx: mpsc::UnboundedReceiver<Task>) {
        debug!(queue = %name, "Task queue started");

        while let Some(task) = task_rx.recv().await {
            trace!(queue = %name, "Running task");
            task();
        }

        debug!(queue = %name, "Task queue terminated");
    }
}

// ============================================================================
// DelayedTask
// ============================================================================

/// Cancellable handle to a pending timer.
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Stops the timer. Idempotent.
    #[inline]
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_tasks_run_in_post_order() {
        let queue = TaskQueue::new("order");
        let seen = Arc::new(Mutex::new(Vec::new()));

        for index in 0..5 {
            let seen = Arc::clone(&seen);
            assert!(queue.post_task(move || seen.lock().push(index)));
        }

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        queue.post_task(move || {
            let _ = done_tx.send(());
        });
        done_rx.await.expect("queue drained");

        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_task_fires_once() {
        let queue = TaskQueue::new("delayed");
        let fired = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&fired);
        let _timer = queue.post_delayed_task(Duration::from_secs(2), move || {
            *counter.lock() += 1;
        });

        sleep(Duration::from_millis(1_900)).await;
        assert_eq!(*fired.lock(), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(*fired.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_delayed_task_never_fires() {
        let queue = TaskQueue::new("cancel");
        let fired = Arc::new(Mutex::new(false));

        let flag = Arc::clone(&fired);
        let timer = queue.post_delayed_task(Duration::from_secs(1), move || {
            *flag.lock() = true;
        });
        timer.cancel();

        sleep(Duration::from_secs(3)).await;
        assert!(!*fired.lock());
    }

    #[tokio::test]
    async fn test_timer_posted_from_plain_thread() {
        let queue = TaskQueue::new("foreign");
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        let timer = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    queue.post_delayed_task(Duration::from_millis(10), move || {
                        let _ = done_tx.send(());
                    })
                })
                .join()
                .expect("poster thread")
        });

        done_rx.await.expect("timer fired");
        drop(timer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_task_until_dropped() {
        let queue = TaskQueue::new("repeat");
        let ticks = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&ticks);
        let timer = queue.post_repeating_task(Duration::from_secs(1), move || {
            *counter.lock() += 1;
        });

        sleep(Duration::from_millis(3_500)).await;
        assert_eq!(*ticks.lock(), 3);

        drop(timer);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(*ticks.lock(), 3);
    }
}
