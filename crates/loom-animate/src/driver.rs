//! Attribute-driven playback.
//!
//! One call to [`AnimationDriver::play`] is one playback:
//!
//! 1. read keyframes and options from the source element's attributes
//! 2. skip if there is nothing to play or reduced motion is preferred
//! 3. apply the start style inline, synchronously
//! 4. run the backend and await it
//! 5. persist the end style inline, unless a newer playback took over
//!
//! Reverse directions swap which boundary keyframe is the start and which is
//! the end; the backend still receives the sequence in declaration order.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use loom_dom::{Dom, DomError, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{AnimationBackend, Playback};
use crate::config::AnimationConfig;
use crate::error::Result;
use crate::events::{EventQueue, PlaybackEvent, SkipReason};
use crate::options::{AnimationDefaults, AnimationOverrides};

/// What to do when the backend reports a reduced-motion preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReducedMotionPolicy {
    /// Leave the element untouched.
    #[default]
    Skip,
    /// Apply the end style without playing.
    JumpToEnd,
}

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Skipped(SkipReason),
    /// A later playback on the same target started first; the end style was
    /// left to it.
    Superseded,
}

type StyleSnapshot = BTreeMap<String, String>;

enum Prepared {
    Done(PlaybackOutcome),
    Playing {
        playback: Playback,
        end: StyleSnapshot,
        generation: u64,
    },
}

/// Plays attribute-declared animations through an [`AnimationBackend`].
///
/// Cloning is cheap; clones share the playback bookkeeping and event queue.
#[derive(Clone)]
pub struct AnimationDriver {
    dom: Dom,
    backend: Rc<dyn AnimationBackend>,
    defaults: AnimationDefaults,
    reduced_motion: ReducedMotionPolicy,
    /// Latest playback per target. Entries leave once that playback ends.
    generations: Rc<RefCell<HashMap<NodeId, u64>>>,
    next_generation: Rc<Cell<u64>>,
    events: Rc<RefCell<EventQueue>>,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("defaults", &self.defaults)
            .field("reduced_motion", &self.reduced_motion)
            .finish_non_exhaustive()
    }
}

impl AnimationDriver {
    pub fn new(dom: Dom, backend: Rc<dyn AnimationBackend>) -> Self {
        Self {
            dom,
            backend,
            defaults: AnimationDefaults::default(),
            reduced_motion: ReducedMotionPolicy::default(),
            generations: Rc::new(RefCell::new(HashMap::new())),
            next_generation: Rc::new(Cell::new(0)),
            events: Rc::new(RefCell::new(EventQueue::new())),
        }
    }

    pub fn with_defaults(mut self, defaults: AnimationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_reduced_motion_policy(mut self, policy: ReducedMotionPolicy) -> Self {
        self.reduced_motion = policy;
        self
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn backend(&self) -> &Rc<dyn AnimationBackend> {
        &self.backend
    }

    pub fn defaults(&self) -> &AnimationDefaults {
        &self.defaults
    }

    /// Targets with a playback in flight.
    pub fn active_playbacks(&self) -> usize {
        self.generations.borrow().len()
    }

    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.events.borrow_mut().drain()
    }

    /// Parse the animation attributes currently on `source`.
    pub fn config_for(&self, source: NodeId) -> AnimationConfig {
        AnimationConfig::from_element(&self.dom.borrow(), source)
    }

    /// Play the animation declared on `source` against `target`.
    ///
    /// Everything up to and including the start style happens before this
    /// returns; the future only waits for the backend and persists the end.
    pub fn play(
        &self,
        source: NodeId,
        target: NodeId,
        overrides: &AnimationOverrides,
    ) -> LocalBoxFuture<'static, Result<PlaybackOutcome>> {
        match self.prepare(source, target, overrides) {
            Err(error) => Box::pin(future::ready(Err(error))),
            Ok(Prepared::Done(outcome)) => Box::pin(future::ready(Ok(outcome))),
            Ok(Prepared::Playing {
                playback,
                end,
                generation,
            }) => {
                let driver = self.clone();
                Box::pin(async move {
                    playback.await;
                    driver.finish(target, generation, &end)
                })
            }
        }
    }

    fn prepare(
        &self,
        source: NodeId,
        target: NodeId,
        overrides: &AnimationOverrides,
    ) -> Result<Prepared> {
        if !self.dom.borrow().is_element(target) {
            return Err(DomError::NotAnElement(target).into());
        }

        let config = self.config_for(source);
        let Some((start, end)) = config.boundary_styles() else {
            debug!(%source, "no keyframes declared, skipping playback");
            return Ok(self.skip(target, SkipReason::NoKeyframes));
        };

        let options = config.options.overlay(overrides).resolve(&self.defaults);
        let (start, end) = if options.is_reversed() {
            (end, start)
        } else {
            (start, end)
        };

        if self.backend.prefers_reduced_motion() {
            debug!(%target, policy = ?self.reduced_motion, "reduced motion preferred");
            if self.reduced_motion == ReducedMotionPolicy::JumpToEnd {
                self.generations.borrow_mut().remove(&target);
                self.apply_style(target, &end)?;
            }
            return Ok(self.skip(target, SkipReason::ReducedMotion));
        }

        self.apply_style(target, &start)?;
        let generation = self.bump_generation(target);
        debug!(
            %target,
            keyframes = config.keyframes.len(),
            duration_ms = options.duration_ms,
            reversed = options.is_reversed(),
            "playback started"
        );
        self.events.borrow_mut().push(PlaybackEvent::Started {
            target,
            keyframes: config.keyframes.len(),
            duration_ms: options.duration_ms,
            reversed: options.is_reversed(),
        });

        let playback = self.backend.animate(target, &config.keyframes, &options);
        Ok(Prepared::Playing {
            playback,
            end,
            generation,
        })
    }

    fn finish(&self, target: NodeId, generation: u64, end: &StyleSnapshot) -> Result<PlaybackOutcome> {
        let current = {
            let mut generations = self.generations.borrow_mut();
            let current = generations.get(&target) == Some(&generation);
            if current {
                generations.remove(&target);
            }
            current
        };
        if !current {
            debug!(%target, "playback superseded, leaving end style to the newer one");
            self.events
                .borrow_mut()
                .push(PlaybackEvent::Superseded { target });
            return Ok(PlaybackOutcome::Superseded);
        }
        self.apply_style(target, end)?;
        debug!(%target, "playback finished");
        self.events
            .borrow_mut()
            .push(PlaybackEvent::Finished { target });
        Ok(PlaybackOutcome::Completed)
    }

    fn skip(&self, target: NodeId, reason: SkipReason) -> Prepared {
        self.events
            .borrow_mut()
            .push(PlaybackEvent::Skipped { target, reason });
        Prepared::Done(PlaybackOutcome::Skipped(reason))
    }

    fn apply_style(&self, target: NodeId, style: &StyleSnapshot) -> Result<()> {
        self.dom.borrow_mut().style_mut(target)?.assign(style);
        Ok(())
    }

    /// Generations are unique across targets, so a removed entry can never
    /// be matched by a stale playback.
    fn bump_generation(&self, target: NodeId) -> u64 {
        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        self.generations.borrow_mut().insert(target, generation);
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TimelineBackend;
    use crate::options::PlaybackDirection;
    use loom_dom::{Document, EventLoop};
    use std::cell::Cell;

    struct Fixture {
        event_loop: EventLoop,
        backend: Rc<TimelineBackend>,
        driver: AnimationDriver,
        element: NodeId,
    }

    fn fixture(attributes: &[(&str, &str)]) -> Fixture {
        let mut document = Document::new();
        let element = document.create_element("div");
        let body = document.body();
        document.append_child(body, element).unwrap();
        for (name, value) in attributes {
            document.set_attribute(element, name, *value).unwrap();
        }
        let event_loop = EventLoop::new();
        let backend = Rc::new(TimelineBackend::new(event_loop.clone()).with_history(16));
        let driver = AnimationDriver::new(Dom::new(document), backend.clone());
        Fixture {
            event_loop,
            backend,
            driver,
            element,
        }
    }

    fn style_of(driver: &AnimationDriver, element: NodeId, property: &str) -> Option<String> {
        driver
            .dom()
            .borrow()
            .style(element)
            .and_then(|style| style.get(property).map(str::to_string))
    }

    fn spawn_play(fixture: &Fixture, overrides: AnimationOverrides) -> Rc<Cell<Option<PlaybackOutcome>>> {
        let outcome = Rc::new(Cell::new(None));
        let slot = outcome.clone();
        let playback = fixture
            .driver
            .play(fixture.element, fixture.element, &overrides);
        fixture.event_loop.spawn_local(async move {
            slot.set(playback.await.ok());
        });
        outcome
    }

    const FADE: &[(&str, &str)] = &[
        ("animation-keyframe-from-opacity", "0"),
        ("animation-keyframe-to-opacity", "1"),
    ];

    #[test]
    fn test_start_style_applied_synchronously_then_end_style() {
        let fixture = fixture(FADE);
        let outcome = spawn_play(&fixture, AnimationOverrides::new());

        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("0"));
        fixture.event_loop.advance(199);
        assert_eq!(outcome.get(), None);
        fixture.event_loop.advance(1);
        assert_eq!(outcome.get(), Some(PlaybackOutcome::Completed));
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_reverse_direction_swaps_boundaries() {
        let fixture = fixture(FADE);
        let outcome = spawn_play(&fixture, AnimationOverrides::reversed());

        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("1"));
        fixture.event_loop.advance(200);
        assert_eq!(outcome.get(), Some(PlaybackOutcome::Completed));
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("0"));

        // The backend still sees declaration order.
        let history = fixture.backend.history();
        assert_eq!(history[0].keyframes[0].offset, 0.0);
        assert_eq!(history[0].options.direction, Some(PlaybackDirection::Reverse));
    }

    #[test]
    fn test_alternate_reverse_counts_as_reversed() {
        let fixture = fixture(FADE);
        spawn_play(
            &fixture,
            AnimationOverrides::new().with_direction(PlaybackDirection::AlternateReverse),
        );
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_no_keyframes_leaves_style_untouched() {
        let fixture = fixture(&[("animation-option-duration", "100")]);
        let outcome = pollster::block_on(fixture.driver.play(
            fixture.element,
            fixture.element,
            &AnimationOverrides::new(),
        ));
        assert_eq!(outcome, Ok(PlaybackOutcome::Skipped(SkipReason::NoKeyframes)));
        assert!(fixture.driver.dom().borrow().style(fixture.element).unwrap().is_empty());
        assert!(fixture.backend.history().is_empty());
    }

    #[test]
    fn test_reduced_motion_skips_without_mutation() {
        let fixture = fixture(FADE);
        fixture.backend.set_reduced_motion(true);
        let outcome = pollster::block_on(fixture.driver.play(
            fixture.element,
            fixture.element,
            &AnimationOverrides::new(),
        ));
        assert_eq!(outcome, Ok(PlaybackOutcome::Skipped(SkipReason::ReducedMotion)));
        assert!(fixture.driver.dom().borrow().style(fixture.element).unwrap().is_empty());
    }

    #[test]
    fn test_reduced_motion_jump_to_end() {
        let fixture = fixture(FADE);
        fixture.backend.set_reduced_motion(true);
        let driver = fixture
            .driver
            .clone()
            .with_reduced_motion_policy(ReducedMotionPolicy::JumpToEnd);
        let outcome = pollster::block_on(driver.play(
            fixture.element,
            fixture.element,
            &AnimationOverrides::new(),
        ));
        assert_eq!(outcome, Ok(PlaybackOutcome::Skipped(SkipReason::ReducedMotion)));
        assert_eq!(style_of(&driver, fixture.element, "opacity").as_deref(), Some("1"));
        assert!(fixture.backend.history().is_empty());
    }

    #[test]
    fn test_override_duration_wins() {
        let mut attributes = FADE.to_vec();
        attributes.push(("animation-option-duration", "500"));
        let fixture = fixture(&attributes);
        let outcome = spawn_play(&fixture, AnimationOverrides::new().with_duration(100.0));
        fixture.event_loop.advance(100);
        assert_eq!(outcome.get(), Some(PlaybackOutcome::Completed));
        assert_eq!(fixture.backend.history()[0].options.duration_ms, 100.0);
    }

    #[test]
    fn test_timing_properties_are_not_persisted() {
        let fixture = fixture(&[
            ("animation-keyframe-from-opacity", "0"),
            ("animation-keyframe-to-opacity", "1"),
            ("animation-keyframe-to-easing", "linear"),
        ]);
        spawn_play(&fixture, AnimationOverrides::new());
        fixture.event_loop.advance(200);
        let dom = fixture.driver.dom().borrow();
        let style = dom.style(fixture.element).unwrap();
        assert_eq!(style.get("easing"), None);
        assert_eq!(style.get("opacity"), Some("1"));
    }

    #[test]
    fn test_latest_playback_wins() {
        let fixture = fixture(FADE);
        let first = spawn_play(&fixture, AnimationOverrides::new());
        fixture.event_loop.advance(100);
        let second = spawn_play(&fixture, AnimationOverrides::reversed());
        fixture.event_loop.advance(100);

        assert_eq!(first.get(), Some(PlaybackOutcome::Superseded));
        // The first playback must not overwrite the reversed start style.
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("1"));
        fixture.event_loop.advance(100);
        assert_eq!(second.get(), Some(PlaybackOutcome::Completed));
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_finished_playbacks_release_their_target() {
        let fixture = fixture(FADE);
        for _ in 0..5 {
            spawn_play(&fixture, AnimationOverrides::new());
            assert_eq!(fixture.driver.active_playbacks(), 1);
            fixture.event_loop.advance(200);
            assert_eq!(fixture.driver.active_playbacks(), 0);
        }

        spawn_play(&fixture, AnimationOverrides::new());
        fixture.event_loop.advance(50);
        spawn_play(&fixture, AnimationOverrides::reversed());
        fixture.event_loop.advance(400);
        assert_eq!(fixture.driver.active_playbacks(), 0);
    }

    #[test]
    fn test_stale_playback_stays_superseded_after_target_is_released() {
        let fixture = fixture(FADE);
        let slow = spawn_play(&fixture, AnimationOverrides::new().with_duration(1000.0));
        let fast = spawn_play(&fixture, AnimationOverrides::new().with_duration(100.0));
        fixture.event_loop.advance(100);
        assert_eq!(fast.get(), Some(PlaybackOutcome::Completed));
        assert_eq!(fixture.driver.active_playbacks(), 0);

        let latest = spawn_play(&fixture, AnimationOverrides::reversed().with_duration(1000.0));
        fixture.event_loop.advance(900);
        assert_eq!(slow.get(), Some(PlaybackOutcome::Superseded));
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("1"));

        fixture.event_loop.advance(100);
        assert_eq!(latest.get(), Some(PlaybackOutcome::Completed));
        assert_eq!(style_of(&fixture.driver, fixture.element, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_events_follow_playback() {
        let fixture = fixture(FADE);
        spawn_play(&fixture, AnimationOverrides::new());
        fixture.event_loop.advance(200);
        let events = fixture.driver.drain_events();
        assert!(matches!(events[0], PlaybackEvent::Started { keyframes: 2, .. }));
        assert_eq!(events[1], PlaybackEvent::Finished { target: fixture.element });
    }

    #[test]
    fn test_non_element_target_is_an_error() {
        let fixture = fixture(FADE);
        let text = fixture.driver.dom().borrow_mut().create_text("x");
        let result = pollster::block_on(fixture.driver.play(
            fixture.element,
            text,
            &AnimationOverrides::new(),
        ));
        assert!(result.is_err());
    }
}
