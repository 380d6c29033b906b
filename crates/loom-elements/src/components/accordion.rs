//! Disclosure widget: a trigger that opens and closes a content region.
//!
//! Opening marks the content `open` and plays the declared animation forward.
//! Closing plays it reversed and only writes the closed state once playback
//! ends, so the content stays visible while it collapses.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use loom_animate::{AnimationOverrides, PlaybackOutcome};
use loom_dom::{Event, ListenerOptions, NodeId};
use nanoid::nanoid;
use tracing::{debug, warn};

use crate::STATE_CHANGE_EVENT;
use crate::error::{ElementError, Result};
use crate::host::{ContentKind, Host};
use crate::traits::{Animator, Component, ContentResolver, Hosted, Lifecycle, ListenerOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccordionState {
    Open,
    #[default]
    Closed,
}

impl AccordionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

#[derive(Debug, Clone, Copy)]
struct Parts {
    trigger: NodeId,
    content: NodeId,
}

pub struct Accordion {
    host: Host,
    state: Cell<AccordionState>,
    parts: Cell<Option<Parts>>,
}

impl Accordion {
    pub const TAG: &'static str = "ui-accordion";

    pub fn new(host: Host) -> Self {
        Self {
            host,
            state: Cell::new(AccordionState::Closed),
            parts: Cell::new(None),
        }
    }

    pub fn state(&self) -> AccordionState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.get().is_open()
    }

    fn parts(&self) -> Result<Parts> {
        if let Some(parts) = self.parts.get() {
            return Ok(parts);
        }
        let trigger = self
            .triggers()?
            .first()
            .copied()
            .ok_or(ElementError::MissingPart {
                component: Self::TAG,
                part: "trigger",
            })?;
        let content = self.content(ContentKind::Element)?;
        let parts = Parts { trigger, content };
        self.parts.set(Some(parts));
        Ok(parts)
    }

    /// Link trigger and content with ids and ARIA attributes.
    fn wire_accessibility(&self, parts: Parts) -> Result<()> {
        let uuid = self.host.attribute("id").unwrap_or_else(|| nanoid!(10));
        let mut document = self.host.dom().borrow_mut();
        let trigger_id = match document.get_attribute(parts.trigger, "id") {
            Some(id) => id.to_string(),
            None => {
                let id = format!("trigger-{uuid}");
                document.set_attribute(parts.trigger, "id", id.as_str())?;
                id
            }
        };
        let content_id = match document.get_attribute(parts.content, "id") {
            Some(id) => id.to_string(),
            None => {
                let id = format!("content-{uuid}");
                document.set_attribute(parts.content, "id", id.as_str())?;
                id
            }
        };
        document.set_attribute(parts.trigger, "aria-controls", content_id)?;
        document.set_attribute(parts.content, "role", "region")?;
        document.set_attribute(parts.content, "aria-labelledby", trigger_id)?;
        Ok(())
    }

    fn write_state(&self, state: AccordionState) -> Result<()> {
        self.state.set(state);
        let parts = self.parts()?;
        let value = state.as_str();
        let mut document = self.host.dom().borrow_mut();
        document.set_attribute(self.host.element(), "data-state", value)?;
        document.set_attribute(parts.trigger, "data-state", value)?;
        document.set_attribute(parts.trigger, "aria-expanded", state.is_open().to_string())?;
        document.set_attribute(parts.content, "data-state", value)?;
        document.set_attribute(parts.content, "aria-hidden", (!state.is_open()).to_string())?;
        Ok(())
    }

    fn change_state(&self, state: AccordionState) -> Result<()> {
        self.write_state(state)?;
        debug!(element = %self.host.element(), state = state.as_str(), "accordion state changed");
        self.host.emit(STATE_CHANGE_EVENT, state.as_str());
        Ok(())
    }

    /// Open and play the animation forward.
    pub fn open(&self) -> LocalBoxFuture<'static, Result<()>> {
        let opened = self.parts().and_then(|parts| {
            self.host
                .dom()
                .borrow_mut()
                .set_attribute(parts.content, "open", "")?;
            self.change_state(AccordionState::Open)
        });
        if let Err(error) = opened {
            return Box::pin(future::ready(Err(error)));
        }
        let playback = self.play_animation(None, &AnimationOverrides::new());
        Box::pin(async move {
            playback.await?;
            Ok(())
        })
    }

    /// Play the animation reversed, then close.
    ///
    /// If a newer playback takes over the content first, the state is left
    /// to whoever started it.
    pub fn close(self: &Rc<Self>) -> LocalBoxFuture<'static, Result<()>> {
        let playback = self.play_animation(None, &AnimationOverrides::reversed());
        let this = Rc::downgrade(self);
        Box::pin(async move {
            let outcome = playback.await?;
            let Some(this) = this.upgrade() else {
                return Ok(());
            };
            if outcome == PlaybackOutcome::Superseded || this.host.is_aborted() {
                return Ok(());
            }
            this.change_state(AccordionState::Closed)?;
            let content = this.parts()?.content;
            this.host
                .dom()
                .borrow_mut()
                .remove_attribute(content, "open")?;
            Ok(())
        })
    }

    pub fn toggle(self: &Rc<Self>) -> LocalBoxFuture<'static, Result<()>> {
        if self.is_open() {
            self.close()
        } else {
            self.open()
        }
    }
}

impl Hosted for Accordion {
    fn host(&self) -> &Host {
        &self.host
    }
}

impl ListenerOwner for Accordion {}
impl ContentResolver for Accordion {}
impl Animator for Accordion {}

impl Lifecycle for Accordion {
    fn mount(self: Rc<Self>) -> Result<()> {
        let parts = self.parts()?;
        let initial = match self.host.attribute("data-state").as_deref() {
            Some("open") => AccordionState::Open,
            _ => AccordionState::Closed,
        };
        self.wire_accessibility(parts)?;
        self.write_state(initial)?;

        let this = Rc::downgrade(&self);
        let event_loop = self.host.event_loop().clone();
        self.attach_trigger_listener(
            move |event: &Event| {
                event.prevent_default();
                let Some(this) = this.upgrade() else {
                    return;
                };
                let toggled = this.toggle();
                event_loop.spawn_local(async move {
                    if let Err(error) = toggled.await {
                        warn!(%error, "accordion toggle failed");
                    }
                });
            },
            None,
            ListenerOptions::default(),
        )?;
        Ok(())
    }
}

impl Component for Accordion {
    fn name(&self) -> &'static str {
        "Accordion"
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
