//! Container that plays its declared animation whenever a trigger fires.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use loom_animate::{AnimationOverrides, PlaybackOutcome};
use loom_dom::{Event, ListenerOptions};
use tracing::warn;

use crate::error::Result;
use crate::host::Host;
use crate::traits::{Animator, Component, ContentResolver, Hosted, Lifecycle, ListenerOwner};

pub struct AnimatedContainer {
    host: Host,
    plays: Cell<usize>,
}

impl AnimatedContainer {
    pub const TAG: &'static str = "ui-animate";

    pub fn new(host: Host) -> Self {
        Self {
            host,
            plays: Cell::new(0),
        }
    }

    /// Number of playbacks started so far.
    pub fn plays(&self) -> usize {
        self.plays.get()
    }

    /// Swap in the placeholder content, if any, then play.
    pub fn play(&self) -> LocalBoxFuture<'static, Result<PlaybackOutcome>> {
        let delay = self.host.settings().swap_revert_delay_ms;
        if let Err(error) = self.swap_content(true, delay) {
            warn!(%error, "content swap failed");
        }
        self.plays.set(self.plays.get() + 1);
        self.play_animation(None, &AnimationOverrides::new())
    }

    fn spawn_play(&self) {
        let playback = self.play();
        self.host.event_loop().spawn_local(async move {
            if let Err(error) = playback.await {
                warn!(%error, "animation failed");
            }
        });
    }
}

impl Hosted for AnimatedContainer {
    fn host(&self) -> &Host {
        &self.host
    }
}

impl ListenerOwner for AnimatedContainer {}
impl ContentResolver for AnimatedContainer {}
impl Animator for AnimatedContainer {}

impl Lifecycle for AnimatedContainer {
    fn mount(self: Rc<Self>) -> Result<()> {
        let this = Rc::downgrade(&self);
        self.attach_trigger_listener(
            move |_: &Event| {
                if let Some(this) = this.upgrade() {
                    this.spawn_play();
                }
            },
            None,
            ListenerOptions::default(),
        )?;
        if self.host.has_attribute("autoplay") {
            self.spawn_play();
        }
        Ok(())
    }
}

impl Component for AnimatedContainer {
    fn name(&self) -> &'static str {
        "AnimatedContainer"
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
