//! Declarative UI elements over the `loom-dom` document model.
//!
//! A component is a plain struct holding a [`Host`] and whatever state it
//! needs. It opts into behaviour through capability traits ([`Lifecycle`],
//! [`ListenerOwner`], [`ContentResolver`], [`Animator`]) and is registered
//! under a tag in an [`ElementRegistry`]. The [`Runtime`] connects matching
//! elements, mounts them on the next microtask and tears them down on
//! removal.
//!
//! ```text
//!   ElementRegistry ──tag──▶ factory(Host) ──▶ Rc<dyn Component>
//!          │                                        │
//!       Runtime::connect ── microtask ──▶ Lifecycle::mount
//!       Runtime::disconnect ───────────▶ destroy + Host::abort
//! ```

pub mod components;
pub mod context;
pub mod error;
pub mod host;
pub mod registry;
pub mod runtime;
pub mod traits;

/// Emitted (bubbling) from a host whenever a component's state changes. The
/// event detail carries the new state name.
pub const STATE_CHANGE_EVENT: &str = "stateChange";

pub use components::{
    Accordion, AccordionState, AnimatedContainer, CalendarDate, DatePicker, Fallback, LoadState,
    PickerState, Theme, ThemeSwitcher,
};
pub use context::{
    DEFAULT_CONTENT_SELECTOR, DEFAULT_EVENT, DEFAULT_SWAP_REVERT_DELAY_MS,
    DEFAULT_SWAP_SELECTOR, DEFAULT_TRIGGER_SELECTOR, ElementContext, HostSettings,
};
pub use error::{ElementError, Result};
pub use host::{ContentKind, Host};
pub use registry::{ComponentFactory, ElementRegistry};
pub use runtime::Runtime;
pub use traits::{Animator, Component, ContentResolver, Hosted, Lifecycle, ListenerOwner};
