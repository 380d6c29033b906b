//! The animation primitive the driver delegates to.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use futures::future::LocalBoxFuture;
use loom_dom::{EventLoop, NodeId};
use tracing::trace;

use crate::keyframes::Keyframe;
use crate::options::AnimationOptions;

/// Future that resolves once the backend has finished one playback.
pub type Playback = LocalBoxFuture<'static, ()>;

/// Something that can play a keyframe sequence on an element.
///
/// The backend only animates; persisting the final style is the driver's job.
pub trait AnimationBackend {
    /// Whether the user asked for reduced motion.
    fn prefers_reduced_motion(&self) -> bool;

    fn animate(&self, target: NodeId, keyframes: &[Keyframe], options: &AnimationOptions) -> Playback;
}

/// A playback recorded by [`TimelineBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRecord {
    pub target: NodeId,
    pub keyframes: Vec<Keyframe>,
    pub options: AnimationOptions,
    pub started_at_ms: u64,
}

/// Backend that completes each playback after `delay + duration` on the
/// event loop's virtual clock.
///
/// Recording is off by default. [`TimelineBackend::with_history`] keeps the
/// most recent `capacity` playbacks and drops older ones.
pub struct TimelineBackend {
    event_loop: EventLoop,
    reduced_motion: Cell<bool>,
    history_capacity: usize,
    history: RefCell<VecDeque<PlaybackRecord>>,
}

impl TimelineBackend {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            event_loop,
            reduced_motion: Cell::new(false),
            history_capacity: 0,
            history: RefCell::new(VecDeque::new()),
        }
    }

    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_reduced_motion(self, prefers: bool) -> Self {
        self.reduced_motion.set(prefers);
        self
    }

    pub fn set_reduced_motion(&self, prefers: bool) {
        self.reduced_motion.set(prefers);
    }

    /// Recorded playbacks, oldest first. Empty unless recording is enabled.
    pub fn history(&self) -> Vec<PlaybackRecord> {
        self.history.borrow().iter().cloned().collect()
    }

    fn record(&self, record: PlaybackRecord) {
        if self.history_capacity == 0 {
            return;
        }
        let mut history = self.history.borrow_mut();
        while history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(record);
    }
}

impl AnimationBackend for TimelineBackend {
    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }

    fn animate(&self, target: NodeId, keyframes: &[Keyframe], options: &AnimationOptions) -> Playback {
        let started_at_ms = self.event_loop.now_ms();
        trace!(%target, total_ms = options.total_ms(), "timeline playback");
        self.record(PlaybackRecord {
            target,
            keyframes: keyframes.to_vec(),
            options: options.clone(),
            started_at_ms,
        });
        self.event_loop.sleep(options.total_ms())
    }
}
