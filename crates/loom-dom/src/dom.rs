//! Shared document handle and event dispatch.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use tracing::trace;

use crate::document::{Document, NodeId};
use crate::event::{Event, EventHandler, ListenerId, ListenerOptions};

/// Reference-counted handle to a [`Document`].
///
/// Borrows are short-lived: take one, read or mutate, drop it. Event handlers
/// run with no borrow held so they may mutate the document themselves.
#[derive(Clone, Default)]
pub struct Dom {
    document: Rc<RefCell<Document>>,
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.document.try_borrow() {
            Ok(document) => document.fmt(f),
            Err(_) => f.write_str("Dom(<borrowed>)"),
        }
    }
}

impl Dom {
    pub fn new(document: Document) -> Self {
        Self {
            document: Rc::new(RefCell::new(document)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    pub fn same_as(&self, other: &Dom) -> bool {
        Rc::ptr_eq(&self.document, &other.document)
    }

    /// Register `handler` for `event_type` on `target`.
    ///
    /// Returns `None` if `options.signal` has already been aborted.
    pub fn add_event_listener<F>(
        &self,
        target: NodeId,
        event_type: &str,
        handler: F,
        options: ListenerOptions,
    ) -> Option<ListenerId>
    where
        F: Fn(&Event) + 'static,
    {
        self.add_event_handler(target, event_type, Rc::new(handler), options)
    }

    pub fn add_event_handler(
        &self,
        target: NodeId,
        event_type: &str,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        self.borrow_mut()
            .listeners_mut()
            .add(target, event_type, handler, options)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.borrow_mut().listeners_mut().remove(id)
    }

    /// Dispatch `event` at `target`, then up the ancestor chain if it bubbles.
    ///
    /// Returns `false` if a handler called [`Event::prevent_default`].
    pub fn dispatch_event(&self, target: NodeId, event: &Event) -> bool {
        event.set_target(target);
        let path = {
            let document = self.borrow();
            let mut path = vec![target];
            if event.bubbles() {
                let mut current = document.parent(target);
                while let Some(node) = current {
                    path.push(node);
                    current = document.parent(node);
                }
            }
            path
        };

        for node in path {
            let handlers = self
                .borrow_mut()
                .listeners_mut()
                .take_matching(node, event.event_type());
            if !handlers.is_empty() {
                trace!(event = event.event_type(), %node, count = handlers.len(), "dispatch");
            }
            event.set_current_target(Some(node));
            for handler in handlers {
                handler(event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
        event.set_current_target(None);
        !event.default_prevented()
    }
}
