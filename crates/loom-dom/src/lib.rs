//! Document model and runtime substrate for loom elements.
//!
//! Components never touch a real browser. Everything they need is provided
//! here and injected explicitly:
//!
//! ```text
//! Dom (Rc<RefCell<Document>>)
//!   ├── node arena, attributes, inline style
//!   ├── selector queries
//!   └── listener table (abort-signal bound)
//!
//! EventLoop
//!   ├── microtasks
//!   ├── local futures executor
//!   └── virtual-clock timers
//! ```

pub mod abort;
pub mod document;
pub mod dom;
pub mod error;
pub mod event;
pub mod event_loop;
pub mod html;
pub mod selector;
pub mod style;

pub use abort::{AbortController, AbortSignal};
pub use document::{Document, NodeId, NodeKind};
pub use dom::Dom;
pub use error::{DomError, Result};
pub use event::{Event, EventHandler, ListenerId, ListenerOptions, ListenerTable};
pub use event_loop::{EventLoop, TimerId};
pub use selector::{ArenaElement, SelectorList};
pub use style::{InlineStyle, kebab_case};
