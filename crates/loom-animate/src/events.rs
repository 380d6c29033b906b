//! Playback lifecycle events.
//!
//! The driver records one event per decision it makes. Callers poll them
//! after driving the event loop:
//!
//! ```ignore
//! event_loop.advance(250);
//! for event in driver.drain_events() {
//!     if let PlaybackEvent::Finished { target } = event {
//!         println!("finished {target}");
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use loom_dom::NodeId;

/// Why a playback did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The source element declares no keyframes.
    NoKeyframes,
    /// The backend reports a reduced-motion preference.
    ReducedMotion,
}

/// Event emitted when a playback changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// The start style was applied and the backend is running.
    Started {
        target: NodeId,
        keyframes: usize,
        duration_ms: f64,
        reversed: bool,
    },
    /// The end style was persisted.
    Finished { target: NodeId },
    /// Nothing was played.
    Skipped { target: NodeId, reason: SkipReason },
    /// A newer playback on the same target started before this one ended.
    Superseded { target: NodeId },
}

impl PlaybackEvent {
    pub fn target(&self) -> NodeId {
        match self {
            Self::Started { target, .. }
            | Self::Finished { target }
            | Self::Skipped { target, .. }
            | Self::Superseded { target } => *target,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// FIFO queue of playback events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<PlaybackEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PlaybackEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_dom::Document;

    #[test]
    fn test_queue_drains_in_order() {
        let mut document = Document::new();
        let node = document.create_element("div");
        let mut queue = EventQueue::new();
        queue.push(PlaybackEvent::Skipped {
            target: node,
            reason: SkipReason::NoKeyframes,
        });
        queue.push(PlaybackEvent::Finished { target: node });
        assert_eq!(queue.len(), 2);

        let events = queue.drain();
        assert!(queue.is_empty());
        assert!(!events[0].is_finished());
        assert!(events[1].is_finished());
        assert_eq!(events[1].target(), node);
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let mut document = Document::new();
        let node = document.create_element("div");
        let json = serde_json::to_value(PlaybackEvent::Superseded { target: node }).unwrap();
        assert_eq!(json["type"], "superseded");
    }
}
