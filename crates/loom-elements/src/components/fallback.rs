//! Media with a fallback shown while it loads or after it fails.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use loom_dom::{Event, ListenerOptions, NodeId};
use tracing::{debug, warn};

use crate::STATE_CHANGE_EVENT;
use crate::error::{ElementError, Result};
use crate::host::{ContentKind, Host};
use crate::traits::{Component, ContentResolver, Hosted, Lifecycle, ListenerOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Parts {
    content: NodeId,
    fallback: NodeId,
}

pub struct Fallback {
    host: Host,
    state: Cell<LoadState>,
    parts: Cell<Option<Parts>>,
}

impl Fallback {
    pub const TAG: &'static str = "ui-fallback";

    pub fn new(host: Host) -> Self {
        Self {
            host,
            state: Cell::new(LoadState::Loading),
            parts: Cell::new(None),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    fn parts(&self) -> Result<Parts> {
        if let Some(parts) = self.parts.get() {
            return Ok(parts);
        }
        let content = self.content(ContentKind::Element)?;
        let fallback = self
            .host
            .dom()
            .borrow()
            .query_selector(self.host.element(), "[data-fallback]")?
            .ok_or(ElementError::MissingPart {
                component: Self::TAG,
                part: "fallback",
            })?;
        let parts = Parts { content, fallback };
        self.parts.set(Some(parts));
        Ok(parts)
    }

    fn write_state(&self, state: LoadState) -> Result<()> {
        self.state.set(state);
        let parts = self.parts()?;
        let mut document = self.host.dom().borrow_mut();
        document.set_attribute(self.host.element(), "data-state", state.as_str())?;
        match state {
            LoadState::Loading => {
                document.set_attribute(parts.content, "aria-busy", "true")?;
                document.remove_attribute(parts.fallback, "hidden")?;
            }
            LoadState::Loaded => {
                document.remove_attribute(parts.content, "aria-busy")?;
                document.remove_attribute(parts.content, "hidden")?;
                document.set_attribute(parts.fallback, "hidden", "")?;
            }
            LoadState::Failed => {
                document.remove_attribute(parts.content, "aria-busy")?;
                document.set_attribute(parts.content, "hidden", "")?;
                document.remove_attribute(parts.fallback, "hidden")?;
            }
        }
        Ok(())
    }

    /// Move to `state`, emitting `stateChange` when it differs.
    pub fn transition(&self, state: LoadState) -> Result<bool> {
        if self.state.get() == state {
            return Ok(false);
        }
        self.write_state(state)?;
        debug!(element = %self.host.element(), state = state.as_str(), "fallback state changed");
        self.host.emit(STATE_CHANGE_EVENT, state.as_str());
        Ok(true)
    }

    fn listen(self: &Rc<Self>, event_type: &str, content: NodeId, state: LoadState) {
        let this = Rc::downgrade(self);
        self.attach_listener(
            event_type,
            move |_: &Event| {
                if let Some(this) = this.upgrade() {
                    if let Err(error) = this.transition(state) {
                        warn!(%error, "fallback transition failed");
                    }
                }
            },
            Some(content),
            ListenerOptions::default(),
        );
    }
}

impl Hosted for Fallback {
    fn host(&self) -> &Host {
        &self.host
    }
}

impl ListenerOwner for Fallback {}
impl ContentResolver for Fallback {}

impl Lifecycle for Fallback {
    fn mount(self: Rc<Self>) -> Result<()> {
        let parts = self.parts()?;
        let complete = self
            .host
            .dom()
            .borrow()
            .has_attribute(parts.content, "complete");
        let initial = if complete {
            LoadState::Loaded
        } else {
            LoadState::Loading
        };
        self.write_state(initial)?;

        self.listen("load", parts.content, LoadState::Loaded);
        self.listen("error", parts.content, LoadState::Failed);
        Ok(())
    }
}

impl Component for Fallback {
    fn name(&self) -> &'static str {
        "Fallback"
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
