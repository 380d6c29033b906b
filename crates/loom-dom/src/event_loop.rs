//! Cooperative, single-threaded event loop.
//!
//! Three queues are driven from one place:
//! - microtasks (`queue_microtask`), drained before anything else;
//! - spawned futures, polled on a `futures` local executor;
//! - timers on a virtual clock, fired by [`EventLoop::advance`].
//!
//! Time only moves when `advance` is called, so tests and the demo control
//! playback and scheduled work deterministically.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use tracing::{trace, warn};

use crate::abort::AbortSignal;

type Task = Box<dyn FnOnce()>;

/// Identifier of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    due_ms: u64,
    signal: Option<AbortSignal>,
    callback: Task,
}

impl Timer {
    fn is_cancelled(&self) -> bool {
        self.signal.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}

struct LoopState {
    now_ms: Cell<u64>,
    next_timer: Cell<u64>,
    microtasks: RefCell<VecDeque<Task>>,
    timers: RefCell<Vec<Timer>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

/// Handle to the event loop. Cheap to clone; all clones drive the same queues.
#[derive(Clone)]
pub struct EventLoop {
    state: Rc<LoopState>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("now_ms", &self.now_ms())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            state: Rc::new(LoopState {
                now_ms: Cell::new(0),
                next_timer: Cell::new(0),
                microtasks: RefCell::new(VecDeque::new()),
                timers: RefCell::new(Vec::new()),
                pool: RefCell::new(pool),
                spawner,
            }),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.state.now_ms.get()
    }

    /// Run `task` at the next microtask checkpoint.
    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.state.microtasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run `callback` once `delay_ms` of virtual time has passed.
    ///
    /// The timer is dropped without running if `signal` aborts first.
    pub fn set_timeout(
        &self,
        delay_ms: u64,
        signal: Option<AbortSignal>,
        callback: impl FnOnce() + 'static,
    ) -> TimerId {
        let next = self.state.next_timer.get() + 1;
        self.state.next_timer.set(next);
        let id = TimerId(next);
        self.state.timers.borrow_mut().push(Timer {
            id,
            due_ms: self.now_ms().saturating_add(delay_ms),
            signal,
            callback: Box::new(callback),
        });
        trace!(?id, delay_ms, "timer scheduled");
        id
    }

    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let mut timers = self.state.timers.borrow_mut();
        let before = timers.len();
        timers.retain(|timer| timer.id != id);
        before != timers.len()
    }

    /// Timers that are still going to fire.
    pub fn pending_timers(&self) -> usize {
        self.state
            .timers
            .borrow()
            .iter()
            .filter(|timer| !timer.is_cancelled())
            .count()
    }

    /// Spawn a future on the local executor. It first runs at the next
    /// [`run_until_idle`](Self::run_until_idle).
    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) {
        if let Err(error) = self.state.spawner.spawn_local(future) {
            warn!(%error, "failed to spawn local task");
        }
    }

    /// A future that resolves once `delay_ms` of virtual time has passed.
    pub fn sleep(&self, delay_ms: u64) -> LocalBoxFuture<'static, ()> {
        let (sender, receiver) = oneshot::channel::<()>();
        self.set_timeout(delay_ms, None, move || {
            let _ = sender.send(());
        });
        Box::pin(async move {
            let _ = receiver.await;
        })
    }

    /// Drain microtasks and poll spawned futures until neither makes progress.
    pub fn run_until_idle(&self) {
        loop {
            while let Some(task) = self.pop_microtask() {
                task();
            }
            // Nested calls from inside a spawned future only drain microtasks.
            if let Ok(mut pool) = self.state.pool.try_borrow_mut() {
                pool.run_until_stalled();
            }
            if self.state.microtasks.borrow().is_empty() {
                break;
            }
        }
    }

    fn pop_microtask(&self) -> Option<Task> {
        self.state.microtasks.borrow_mut().pop_front()
    }

    /// Advance the virtual clock by `delta_ms`, firing due timers in order.
    ///
    /// Pending microtasks and futures are settled before each timer runs and
    /// once more at the end.
    pub fn advance(&self, delta_ms: u64) {
        let deadline = self.now_ms().saturating_add(delta_ms);
        loop {
            self.run_until_idle();
            let Some(timer) = self.take_next_due(deadline) else {
                break;
            };
            self.state.now_ms.set(self.now_ms().max(timer.due_ms));
            trace!(id = ?timer.id, now_ms = self.now_ms(), "timer fired");
            (timer.callback)();
        }
        self.state.now_ms.set(deadline);
        self.run_until_idle();
    }

    fn take_next_due(&self, deadline: u64) -> Option<Timer> {
        let mut timers = self.state.timers.borrow_mut();
        timers.retain(|timer| !timer.is_cancelled());
        let index = timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= deadline)
            .min_by_key(|(_, timer)| (timer.due_ms, timer.id.0))
            .map(|(index, _)| index)?;
        Some(timers.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;

    #[test]
    fn test_microtasks_run_in_fifo_order() {
        let event_loop = EventLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            event_loop.queue_microtask(move || log.borrow_mut().push(n));
        }
        assert!(log.borrow().is_empty());
        event_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_microtasks_queued_by_microtasks_run_in_same_checkpoint() {
        let event_loop = EventLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_loop = event_loop.clone();
        let inner_log = log.clone();
        event_loop.queue_microtask(move || {
            inner_log.borrow_mut().push("outer");
            let log = inner_log.clone();
            inner_loop.queue_microtask(move || log.borrow_mut().push("inner"));
        });
        event_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let event_loop = EventLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(30, "c"), (10, "a"), (20, "b"), (10, "a2")] {
            let log = log.clone();
            event_loop.set_timeout(delay, None, move || log.borrow_mut().push(label));
        }
        event_loop.advance(15);
        assert_eq!(*log.borrow(), vec!["a", "a2"]);
        assert_eq!(event_loop.now_ms(), 15);
        event_loop.advance(100);
        assert_eq!(*log.borrow(), vec!["a", "a2", "b", "c"]);
        assert_eq!(event_loop.pending_timers(), 0);
    }

    #[test]
    fn test_aborted_timer_never_fires() {
        let event_loop = EventLoop::new();
        let controller = AbortController::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        event_loop.set_timeout(50, Some(controller.signal()), move || flag.set(true));
        assert_eq!(event_loop.pending_timers(), 1);
        controller.abort();
        assert_eq!(event_loop.pending_timers(), 0);
        event_loop.advance(100);
        assert!(!fired.get());
    }

    #[test]
    fn test_spawned_future_resumes_after_sleep() {
        let event_loop = EventLoop::new();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let sleeper = event_loop.sleep(200);
        event_loop.spawn_local(async move {
            sleeper.await;
            flag.set(true);
        });
        event_loop.run_until_idle();
        assert!(!done.get());
        event_loop.advance(199);
        assert!(!done.get());
        event_loop.advance(1);
        assert!(done.get());
    }

    #[test]
    fn test_clear_timeout() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = event_loop.set_timeout(5, None, move || flag.set(true));
        assert!(event_loop.clear_timeout(id));
        event_loop.advance(10);
        assert!(!fired.get());
    }
}
