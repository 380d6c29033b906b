//! Connects registered elements in a document to component instances.
//!
//! Connection builds the instance synchronously and defers `mount` to a
//! microtask so the element's descendants are in place first. Disconnection
//! runs `destroy` and then aborts the host, which revokes every listener and
//! pending timer bound to it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use loom_dom::NodeId;
use tracing::{debug, warn};

use crate::context::ElementContext;
use crate::error::Result;
use crate::host::Host;
use crate::registry::ElementRegistry;
use crate::traits::{Component, Hosted, Lifecycle};

#[derive(Debug)]
pub struct Runtime {
    context: ElementContext,
    registry: ElementRegistry,
    instances: RefCell<HashMap<NodeId, Rc<dyn Component>>>,
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(self.name())
            .field("element", &self.host().element())
            .finish()
    }
}

impl Runtime {
    pub fn new(context: ElementContext, registry: ElementRegistry) -> Self {
        Self {
            context,
            registry,
            instances: RefCell::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &ElementContext {
        &self.context
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.instances.borrow().contains_key(&node)
    }

    /// Instantiate the component registered for `node`'s tag.
    ///
    /// Returns `false` for unregistered tags, already connected nodes and
    /// after [`Runtime::shutdown`].
    pub fn connect(&self, node: NodeId) -> Result<bool> {
        if self.context.is_shut_down() {
            return Ok(false);
        }
        let tag = match self.context.dom().borrow().tag_name(node) {
            Some(tag) => tag.to_string(),
            None => return Ok(false),
        };
        let Some(factory) = self.registry.get(&tag) else {
            return Ok(false);
        };
        if self.is_connected(node) {
            return Ok(false);
        }

        let component = factory(Host::new(node, self.context.clone()));
        debug!(%node, %tag, component = component.name(), "element connected");
        self.instances.borrow_mut().insert(node, component.clone());

        self.context.event_loop().queue_microtask(move || {
            if component.host().is_aborted() {
                debug!(%node, "skipping mount of disconnected element");
                return;
            }
            let name = component.name();
            if let Err(error) = component.mount() {
                warn!(%error, %node, component = name, "mount failed");
            }
        });
        Ok(true)
    }

    /// Connect `root` and every registered descendant, in document order.
    pub fn connect_tree(&self, root: NodeId) -> Result<usize> {
        let nodes: Vec<NodeId> = {
            let document = self.context.dom().borrow();
            std::iter::once(root)
                .chain(document.descendants(root))
                .filter(|node| document.is_element(*node))
                .collect()
        };
        let mut connected = 0;
        for node in nodes {
            if self.connect(node)? {
                connected += 1;
            }
        }
        Ok(connected)
    }

    /// Tear down the instance bound to `node`, if any.
    pub fn disconnect(&self, node: NodeId) -> bool {
        let Some(component) = self.instances.borrow_mut().remove(&node) else {
            return false;
        };
        component.destroy();
        component.host().abort();
        debug!(%node, component = component.name(), "element disconnected");
        true
    }

    /// Detach `node` from the document and disconnect it and its
    /// descendants. Returns the number of instances torn down.
    pub fn remove(&self, node: NodeId) -> Result<usize> {
        let nodes: Vec<NodeId> = {
            let mut document = self.context.dom().borrow_mut();
            document.detach(node)?;
            std::iter::once(node)
                .chain(document.descendants(node))
                .collect()
        };
        Ok(nodes
            .into_iter()
            .filter(|node| self.disconnect(*node))
            .count())
    }

    /// Destroy every instance and abort the shared context, revoking all
    /// listeners and timers in one step.
    pub fn shutdown(&self) -> usize {
        let instances: Vec<_> = self.instances.borrow_mut().drain().collect();
        for (_, component) in &instances {
            component.destroy();
        }
        self.context.shutdown();
        debug!(instances = instances.len(), "runtime shut down");
        instances.len()
    }

    /// The instance bound to `node`, if it is a `T`.
    pub fn component<T: 'static>(&self, node: NodeId) -> Option<Rc<T>> {
        let component = self.instances.borrow().get(&node)?.clone();
        component.as_any().downcast::<T>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Accordion, Fallback};
    use loom_dom::{Document, Dom, EventLoop};

    fn runtime(markup: &str) -> (Runtime, NodeId) {
        let mut document = Document::new();
        let body = document.body();
        document.append_html(body, markup).unwrap();
        let context = ElementContext::with_timeline(Dom::new(document), EventLoop::new());
        (Runtime::new(context, ElementRegistry::builtin()), body)
    }

    #[test]
    fn test_connect_tree_mounts_on_microtask() {
        let (runtime, body) = runtime(
            r#"<ui-fallback><img data-content><span data-fallback></span></ui-fallback>
               <div><ui-fallback><img data-content complete><i data-fallback></i></ui-fallback></div>
               <unknown-element></unknown-element>"#,
        );
        assert_eq!(runtime.connect_tree(body).unwrap(), 2);
        assert_eq!(runtime.len(), 2);

        let first = runtime
            .context()
            .dom()
            .borrow()
            .query_selector(body, "ui-fallback")
            .unwrap()
            .unwrap();
        assert_eq!(runtime.context().dom().borrow().get_attribute(first, "data-state"), None);
        runtime.context().event_loop().run_until_idle();
        assert_eq!(
            runtime.context().dom().borrow().get_attribute(first, "data-state"),
            Some("loading")
        );
        assert!(runtime.component::<Fallback>(first).is_some());
        assert!(runtime.component::<Accordion>(first).is_none());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let (runtime, body) = runtime("<ui-animate></ui-animate>");
        let node = runtime.context().dom().borrow().element_children(body)[0];
        assert!(runtime.connect(node).unwrap());
        assert!(!runtime.connect(node).unwrap());
        assert!(!runtime.connect(body).unwrap());
    }

    #[test]
    fn test_disconnect_before_mount_skips_mount() {
        let (runtime, body) = runtime(
            r#"<ui-fallback><img data-content><span data-fallback></span></ui-fallback>"#,
        );
        let node = runtime.context().dom().borrow().element_children(body)[0];
        runtime.connect(node).unwrap();
        assert!(runtime.disconnect(node));
        assert!(!runtime.disconnect(node));
        runtime.context().event_loop().run_until_idle();
        assert_eq!(runtime.context().dom().borrow().get_attribute(node, "data-state"), None);
    }

    #[test]
    fn test_remove_disconnects_subtree() {
        let (runtime, body) = runtime(
            r#"<section><ui-animate></ui-animate><ui-animate></ui-animate></section>"#,
        );
        runtime.connect_tree(body).unwrap();
        let section = runtime.context().dom().borrow().element_children(body)[0];
        assert_eq!(runtime.remove(section).unwrap(), 2);
        assert!(runtime.is_empty());
        assert!(!runtime.context().dom().borrow().is_connected(section));
    }

    #[test]
    fn test_shutdown_aborts_every_host() {
        let (runtime, body) = runtime(
            r#"<ui-fallback><img data-content><span data-fallback></span></ui-fallback>
               <ui-animate></ui-animate>"#,
        );
        runtime.connect_tree(body).unwrap();
        let nodes = runtime.context().dom().borrow().element_children(body);
        let fallback = runtime.component::<Fallback>(nodes[0]).unwrap();

        assert_eq!(runtime.shutdown(), 2);
        assert!(runtime.is_empty());
        assert!(fallback.host().is_aborted());
        assert!(!runtime.connect(nodes[1]).unwrap());

        runtime.context().event_loop().run_until_idle();
        assert_eq!(runtime.context().dom().borrow().get_attribute(nodes[0], "data-state"), None);
    }
}
