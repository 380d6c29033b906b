//! Events and listener bookkeeping.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::abort::AbortSignal;
use crate::document::NodeId;

/// Callback invoked for a dispatched event.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Identifier of one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A dispatched event.
///
/// Targets are filled in by [`Dom::dispatch_event`](crate::Dom::dispatch_event).
#[derive(Debug)]
pub struct Event {
    event_type: String,
    detail: Option<String>,
    bubbles: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    /// A non-bubbling event.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: None,
            bubbles: false,
            target: Cell::new(None),
            current_target: Cell::new(None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// An event that propagates from the target up through its ancestors.
    pub fn bubbling(event_type: impl Into<String>) -> Self {
        Self {
            bubbles: true,
            ..Self::new(event_type)
        }
    }

    /// Attach a payload, as a custom notification does.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        self.target.set(Some(target));
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        self.current_target.set(node);
    }
}

/// Options for [`Dom::add_event_listener`](crate::Dom::add_event_listener).
#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    /// Revokes the registration when aborted.
    pub signal: Option<AbortSignal>,
    /// Remove the registration after its first invocation.
    pub once: bool,
}

impl ListenerOptions {
    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

struct Registration {
    id: ListenerId,
    target: NodeId,
    event_type: String,
    handler: EventHandler,
    signal: Option<AbortSignal>,
    once: bool,
}

impl Registration {
    fn is_live(&self) -> bool {
        !self.signal.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}

/// All listener registrations of one document.
#[derive(Default)]
pub struct ListenerTable {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl ListenerTable {
    /// Register a handler. Returns `None` when the signal is already aborted.
    pub fn add(
        &mut self,
        target: NodeId,
        event_type: &str,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        if options.signal.as_ref().is_some_and(AbortSignal::is_aborted) {
            return None;
        }
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.registrations.push(Registration {
            id,
            target,
            event_type: event_type.to_string(),
            handler,
            signal: options.signal,
            once: options.once,
        });
        Some(id)
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        before != self.registrations.len()
    }

    /// Drop every registration whose signal has aborted.
    pub fn prune(&mut self) {
        self.registrations.retain(Registration::is_live);
    }

    /// Handlers registered on `target` for `event_type`, in registration order.
    ///
    /// `once` registrations are removed as they are handed out.
    pub fn take_matching(&mut self, target: NodeId, event_type: &str) -> Vec<EventHandler> {
        self.prune();
        let handlers = self
            .registrations
            .iter()
            .filter(|r| r.target == target && r.event_type == event_type)
            .map(|r| r.handler.clone())
            .collect();
        self.registrations
            .retain(|r| !(r.once && r.target == target && r.event_type == event_type));
        handlers
    }

    /// Live registrations on `target`.
    pub fn count_for(&self, target: NodeId) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.target == target && r.is_live())
            .count()
    }

    pub fn len(&self) -> usize {
        self.registrations.iter().filter(|r| r.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerTable")
            .field("live", &self.len())
            .finish()
    }
}
