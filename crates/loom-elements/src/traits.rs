//! Capabilities a component composes.
//!
//! ```text
//! Hosted ─┬─ Lifecycle ── Component
//!         ├─ ListenerOwner
//!         └─ ContentResolver ── Animator
//! ```
//!
//! Every capability reaches the instance's [`Host`] through [`Hosted`]; the
//! default methods forward to it. A component implements only the
//! capabilities it uses.

use std::any::Any;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use loom_animate::{AnimationOverrides, PlaybackOutcome};
use loom_dom::{AbortSignal, Event, ListenerId, ListenerOptions, NodeId};

use crate::error::Result;
use crate::host::{ContentKind, Host};

/// Access to the per-instance host.
pub trait Hosted {
    fn host(&self) -> &Host;
}

/// Mount and teardown hooks driven by the [`Runtime`](crate::Runtime).
pub trait Lifecycle: Hosted {
    /// Runs once, on the microtask after connection, when descendants exist.
    fn mount(self: Rc<Self>) -> Result<()> {
        Ok(())
    }

    /// Runs synchronously on disconnect, before listeners are revoked.
    fn destroy(&self) {}
}

/// Listener registration bound to the instance's abort signal.
pub trait ListenerOwner: Hosted {
    fn signal(&self) -> AbortSignal {
        self.host().signal()
    }

    fn attach_listener<F>(
        &self,
        event_type: &str,
        handler: F,
        target: Option<NodeId>,
        options: ListenerOptions,
    ) -> Option<ListenerId>
    where
        Self: Sized,
        F: Fn(&Event) + 'static,
    {
        self.host()
            .attach_listener(event_type, handler, target, options)
    }

    fn attach_trigger_listener<F>(
        &self,
        handler: F,
        event_type: Option<&str>,
        options: ListenerOptions,
    ) -> Result<Vec<ListenerId>>
    where
        Self: Sized,
        F: Fn(&Event) + 'static,
    {
        self.host()
            .attach_trigger_listener(handler, event_type, options)
    }
}

/// Lookup of the instance's structural parts.
pub trait ContentResolver: Hosted {
    fn content(&self, expected: ContentKind) -> Result<NodeId> {
        self.host().content(expected)
    }

    fn triggers(&self) -> Result<Vec<NodeId>> {
        self.host().triggers()
    }

    fn swap_content(&self, auto_revert: bool, revert_delay_ms: u64) -> Result<bool> {
        self.host().swap_content(auto_revert, revert_delay_ms)
    }
}

/// Playback of the animation declared on the host element.
pub trait Animator: ContentResolver {
    /// Play against `target`, or the content element when `None`.
    ///
    /// The start style is applied before this returns.
    fn play_animation(
        &self,
        target: Option<NodeId>,
        overrides: &AnimationOverrides,
    ) -> LocalBoxFuture<'static, Result<PlaybackOutcome>> {
        let target = match target {
            Some(target) => target,
            None => match self.content(ContentKind::Element) {
                Ok(content) => content,
                Err(error) => return Box::pin(future::ready(Err(error))),
            },
        };
        let host = self.host();
        let playback = host.driver().play(host.element(), target, overrides);
        Box::pin(async move { Ok(playback.await?) })
    }
}

/// A registered element type.
pub trait Component: Lifecycle + 'static {
    /// Component type name, for logging.
    fn name(&self) -> &'static str;

    fn as_any(self: Rc<Self>) -> Rc<dyn Any>;
}
