//! Per-instance host: listener bookkeeping, part lookup and content swapping.
//!
//! Every component owns one [`Host`]. All listeners and timers it registers
//! are bound to the host's abort signal, so [`Host::abort`] revokes them in
//! one step when the element is disconnected.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use loom_animate::AnimationDriver;
use loom_dom::{
    AbortController, AbortSignal, Dom, Event, EventHandler, EventLoop, ListenerId,
    ListenerOptions, NodeId,
};
use tracing::{debug, warn};

use crate::context::{ElementContext, HostSettings};
use crate::error::{ElementError, Result};

/// What [`Host::content`] expects the content node to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Any element.
    Element,
    /// A `<template>` with a content fragment.
    Template,
    /// An element with this tag name.
    Tag(String),
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element => f.write_str("an element"),
            Self::Template => f.write_str("a <template>"),
            Self::Tag(tag) => write!(f, "a <{tag}>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwapPass {
    Forward,
    Revert,
}

/// Fragment reused across swaps from one `<template>`.
#[derive(Debug, Clone, Copy)]
enum TemplateSwap {
    /// Holds the clone while it is not displayed.
    Spare(NodeId),
    /// Holds the template's own nodes while its storage parks the originals.
    Holding(NodeId),
}

/// Host state shared by every component instance.
#[derive(Debug, Clone)]
pub struct Host {
    element: NodeId,
    context: ElementContext,
    controller: Rc<AbortController>,
    template_swaps: Rc<RefCell<HashMap<NodeId, TemplateSwap>>>,
}

impl Host {
    pub fn new(element: NodeId, context: ElementContext) -> Self {
        let controller = Rc::new(context.signal().child());
        Self {
            element,
            context,
            controller,
            template_swaps: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn context(&self) -> &ElementContext {
        &self.context
    }

    pub fn dom(&self) -> &Dom {
        self.context.dom()
    }

    pub fn event_loop(&self) -> &EventLoop {
        self.context.event_loop()
    }

    pub fn driver(&self) -> &AnimationDriver {
        self.context.driver()
    }

    pub fn settings(&self) -> &HostSettings {
        self.context.settings()
    }

    pub fn signal(&self) -> AbortSignal {
        self.controller.signal()
    }

    pub fn is_aborted(&self) -> bool {
        self.controller.is_aborted()
    }

    /// Revoke every listener and pending timer registered through this host.
    pub fn abort(&self) {
        self.controller.abort();
        self.dom().borrow_mut().listeners_mut().prune();
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.dom()
            .borrow()
            .get_attribute(self.element, name)
            .map(str::to_string)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.dom().borrow().has_attribute(self.element, name)
    }

    /// Event type used for trigger bindings: the `event` attribute, or the
    /// configured default.
    pub fn event_name(&self) -> String {
        self.attribute("event")
            .unwrap_or_else(|| self.settings().event.clone())
    }

    /// Write the `event` attribute. Bindings already made are not moved.
    pub fn set_event_name(&self, event: &str) -> Result<()> {
        self.dom()
            .borrow_mut()
            .set_attribute(self.element, "event", event)?;
        Ok(())
    }

    pub fn trigger_selector(&self) -> String {
        self.attribute("trigger")
            .unwrap_or_else(|| self.settings().trigger_selector.clone())
    }

    pub fn content_selector(&self) -> String {
        self.attribute("content")
            .unwrap_or_else(|| self.settings().content_selector.clone())
    }

    pub fn swap_selector(&self) -> String {
        self.attribute("swap")
            .unwrap_or_else(|| self.settings().swap_selector.clone())
    }

    /// Elements matching the trigger selector, in document order.
    pub fn triggers(&self) -> Result<Vec<NodeId>> {
        let selector = self.trigger_selector();
        Ok(self
            .dom()
            .borrow()
            .query_selector_all(self.element, &selector)?)
    }

    /// The content element, checked against `expected`.
    pub fn content(&self, expected: ContentKind) -> Result<NodeId> {
        let selector = self.content_selector();
        let document = self.dom().borrow();
        let node = document
            .query_selector(self.element, &selector)?
            .ok_or(ElementError::ContentNotFound { selector })?;
        let matches = match &expected {
            ContentKind::Element => document.is_element(node),
            ContentKind::Template => document.is_template(node),
            ContentKind::Tag(tag) => document
                .tag_name(node)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag)),
        };
        if matches {
            Ok(node)
        } else {
            Err(ElementError::ContentMismatch { node, expected })
        }
    }

    /// Listen for `event_type` on `target` (the body when `None`) until the
    /// host aborts.
    pub fn attach_listener<F>(
        &self,
        event_type: &str,
        handler: F,
        target: Option<NodeId>,
        options: ListenerOptions,
    ) -> Option<ListenerId>
    where
        F: Fn(&Event) + 'static,
    {
        let target = target.unwrap_or_else(|| self.dom().borrow().body());
        self.dom().add_event_listener(
            target,
            event_type,
            handler,
            options.with_signal(self.signal()),
        )
    }

    /// Listen on every trigger element until the host aborts.
    ///
    /// `event_type` defaults to [`event_name`](Self::event_name).
    pub fn attach_trigger_listener<F>(
        &self,
        handler: F,
        event_type: Option<&str>,
        options: ListenerOptions,
    ) -> Result<Vec<ListenerId>>
    where
        F: Fn(&Event) + 'static,
    {
        let event_type = event_type
            .map(str::to_string)
            .unwrap_or_else(|| self.event_name());
        let handler: EventHandler = Rc::new(handler);
        let options = options.with_signal(self.signal());
        let ids = self
            .triggers()?
            .into_iter()
            .filter_map(|trigger| {
                self.dom()
                    .add_event_handler(trigger, &event_type, handler.clone(), options.clone())
            })
            .collect();
        Ok(ids)
    }

    /// Exchange the content's children with the swap element's children.
    ///
    /// A `<template>` swap source is cloned in, and the current content is
    /// parked in its storage. With `auto_revert`, the exchange is undone after
    /// `revert_delay_ms` unless the host aborts first; the revert moves the
    /// original nodes back. The clone is cloned once per template and reused
    /// by later swaps, since the arena never frees nodes. Returns `false`
    /// when there is no swap element.
    pub fn swap_content(&self, auto_revert: bool, revert_delay_ms: u64) -> Result<bool> {
        if !self.exchange(SwapPass::Forward)? {
            return Ok(false);
        }
        if auto_revert {
            let host = self.clone();
            self.event_loop()
                .set_timeout(revert_delay_ms, Some(self.signal()), move || {
                    if let Err(error) = host.exchange(SwapPass::Revert) {
                        warn!(%error, element = %host.element, "content revert failed");
                    }
                });
        }
        Ok(true)
    }

    fn exchange(&self, pass: SwapPass) -> Result<bool> {
        let selector = self.swap_selector();
        let Some(swap) = self
            .dom()
            .borrow()
            .query_selector(self.element, &selector)?
        else {
            return Ok(false);
        };
        let content = self.content(ContentKind::Element)?;

        let mut document = self.dom().borrow_mut();
        let current = document.children(content).to_vec();
        let mut template_swaps = self.template_swaps.borrow_mut();
        let incoming = match document.template_content(swap) {
            Some(storage) if pass == SwapPass::Forward => match template_swaps.get(&swap).copied() {
                Some(TemplateSwap::Holding(fragment)) => {
                    // Forward again without a revert in between.
                    let copy = document.clone_node(fragment, true)?;
                    let incoming = document.children(copy).to_vec();
                    document.replace_children(storage, &current)?;
                    incoming
                }
                spare => {
                    let fragment = match spare {
                        Some(TemplateSwap::Spare(fragment)) => fragment,
                        _ => document.clone_node(storage, true)?,
                    };
                    let incoming = document.children(fragment).to_vec();
                    let template_nodes = document.children(storage).to_vec();
                    document.replace_children(fragment, &template_nodes)?;
                    document.replace_children(storage, &current)?;
                    template_swaps.insert(swap, TemplateSwap::Holding(fragment));
                    incoming
                }
            },
            Some(storage) => {
                let parked = document.children(storage).to_vec();
                match template_swaps.get(&swap).copied() {
                    Some(TemplateSwap::Holding(fragment)) => {
                        let template_nodes = document.children(fragment).to_vec();
                        document.replace_children(storage, &template_nodes)?;
                        document.replace_children(fragment, &current)?;
                        template_swaps.insert(swap, TemplateSwap::Spare(fragment));
                    }
                    _ => document.replace_children(storage, &current)?,
                }
                parked
            }
            None => {
                let placeholder = document.children(swap).to_vec();
                document.replace_children(swap, &current)?;
                placeholder
            }
        };
        document.replace_children(content, &incoming)?;
        debug!(element = %self.element, ?pass, "content swapped");
        Ok(true)
    }

    /// Dispatch a bubbling notification from the host element.
    pub fn emit(&self, event_type: &str, detail: &str) -> bool {
        let event = Event::bubbling(event_type).with_detail(detail);
        self.dom().dispatch_event(self.element, &event)
    }
}
