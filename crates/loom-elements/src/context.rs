//! Shared services injected into every element.

use std::rc::Rc;

use loom_animate::{AnimationDriver, TimelineBackend};
use loom_dom::{AbortController, AbortSignal, Dom, EventLoop};
use tracing::debug;

pub const DEFAULT_EVENT: &str = "click";
pub const DEFAULT_TRIGGER_SELECTOR: &str = "[data-trigger]";
pub const DEFAULT_CONTENT_SELECTOR: &str = "[data-content]";
pub const DEFAULT_SWAP_SELECTOR: &str = "[data-swap]";
pub const DEFAULT_SWAP_REVERT_DELAY_MS: u64 = 800;

/// Fallbacks used when an element does not override them with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSettings {
    pub event: String,
    pub trigger_selector: String,
    pub content_selector: String,
    pub swap_selector: String,
    pub swap_revert_delay_ms: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            event: DEFAULT_EVENT.to_string(),
            trigger_selector: DEFAULT_TRIGGER_SELECTOR.to_string(),
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            swap_selector: DEFAULT_SWAP_SELECTOR.to_string(),
            swap_revert_delay_ms: DEFAULT_SWAP_REVERT_DELAY_MS,
        }
    }
}

/// The document, event loop and animation driver an element runs against.
///
/// Every host's abort controller is a child of the context's, so
/// [`ElementContext::shutdown`] tears down all of them at once.
#[derive(Debug, Clone)]
pub struct ElementContext {
    dom: Dom,
    event_loop: EventLoop,
    driver: AnimationDriver,
    settings: Rc<HostSettings>,
    lifetime: Rc<AbortController>,
}

impl ElementContext {
    pub fn new(dom: Dom, event_loop: EventLoop, driver: AnimationDriver) -> Self {
        Self {
            dom,
            event_loop,
            driver,
            settings: Rc::new(HostSettings::default()),
            lifetime: Rc::new(AbortController::new()),
        }
    }

    /// Context whose animations run on `event_loop`'s virtual clock.
    pub fn with_timeline(dom: Dom, event_loop: EventLoop) -> Self {
        let backend = Rc::new(TimelineBackend::new(event_loop.clone()));
        let driver = AnimationDriver::new(dom.clone(), backend);
        Self::new(dom, event_loop, driver)
    }

    pub fn with_settings(mut self, settings: HostSettings) -> Self {
        self.settings = Rc::new(settings);
        self
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// Aborted once the context shuts down.
    pub fn signal(&self) -> AbortSignal {
        self.lifetime.signal()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifetime.is_aborted()
    }

    /// Abort every host created from this context and drop their listeners.
    pub fn shutdown(&self) {
        self.lifetime.abort();
        self.dom.borrow_mut().listeners_mut().prune();
        debug!("element context shut down");
    }
}
