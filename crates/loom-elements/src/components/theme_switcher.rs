//! Tabbed theme preview.
//!
//! The themed region is the first non-button `[data-tab]` element; its
//! `data-tab` holds the initial theme. Every `button[data-tab]` switches to the
//! theme named by its `data-theme` attribute.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use loom_dom::{Event, ListenerOptions, NodeId};
use tracing::{debug, trace, warn};

use crate::STATE_CHANGE_EVENT;
use crate::error::{ElementError, Result};
use crate::host::Host;
use crate::traits::{Component, Hosted, Lifecycle, ListenerOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Meanjin,
    #[default]
    Gadigal,
    Naarm,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Meanjin, Theme::Gadigal, Theme::Naarm];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meanjin => "meanjin",
            Self::Gadigal => "gadigal",
            Self::Naarm => "naarm",
        }
    }

    pub fn class_name(self) -> String {
        format!("theme-{}", self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or(())
    }
}

pub struct ThemeSwitcher {
    host: Host,
    theme: Cell<Theme>,
    panel: Cell<Option<NodeId>>,
}

impl ThemeSwitcher {
    pub const TAG: &'static str = "ui-theme-switcher";
    pub const PREVIEW_TAG: &'static str = "ui-component-preview";

    pub fn new(host: Host) -> Self {
        Self {
            host,
            theme: Cell::new(Theme::default()),
            panel: Cell::new(None),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    fn panel(&self) -> Result<NodeId> {
        if let Some(panel) = self.panel.get() {
            return Ok(panel);
        }
        let document = self.host.dom().borrow();
        let panel = document
            .query_selector_all(self.host.element(), "[data-tab]")?
            .into_iter()
            .find(|node| document.tag_name(*node) != Some("button"))
            .ok_or(ElementError::MissingPart {
                component: Self::TAG,
                part: "[data-tab] panel",
            })?;
        self.panel.set(Some(panel));
        Ok(panel)
    }

    /// Switch to the theme called `name`. Unknown names are ignored and
    /// return `Ok(false)`.
    pub fn change_theme(&self, name: &str) -> Result<bool> {
        let Ok(theme) = name.parse::<Theme>() else {
            trace!(name, "ignoring unknown theme");
            return Ok(false);
        };
        self.theme.set(theme);
        self.write_state()?;
        debug!(element = %self.host.element(), %theme, "theme changed");
        self.host.emit(STATE_CHANGE_EVENT, theme.as_str());
        Ok(true)
    }

    fn write_state(&self) -> Result<()> {
        let panel = self.panel()?;
        let theme = self.theme.get();
        let element = self.host.element();
        let mut document = self.host.dom().borrow_mut();
        document.set_attribute(element, "data-tab", theme.as_str())?;
        document.set_attribute(panel, "data-tab", theme.as_str())?;
        for other in Theme::ALL {
            document.remove_class(element, &other.class_name())?;
        }
        document.add_class(element, &theme.class_name())?;
        Ok(())
    }
}

impl Hosted for ThemeSwitcher {
    fn host(&self) -> &Host {
        &self.host
    }
}

impl ListenerOwner for ThemeSwitcher {}

impl Lifecycle for ThemeSwitcher {
    fn mount(self: Rc<Self>) -> Result<()> {
        let panel = self.panel()?;
        let initial: Theme = self
            .host
            .dom()
            .borrow()
            .get_attribute(panel, "data-tab")
            .and_then(|name| name.parse().ok())
            .unwrap_or_default();
        self.theme.set(initial);
        self.write_state()?;

        let buttons = self
            .host
            .dom()
            .borrow()
            .query_selector_all(self.host.element(), "button[data-tab]")?;
        for button in buttons {
            let this = Rc::downgrade(&self);
            let dom = self.host.dom().clone();
            self.attach_listener(
                "click",
                move |_: &Event| {
                    let Some(this) = this.upgrade() else {
                        return;
                    };
                    let requested = dom
                        .borrow()
                        .get_attribute(button, "data-theme")
                        .map(str::to_string);
                    if let Some(name) = requested {
                        if let Err(error) = this.change_theme(&name) {
                            warn!(%error, "theme change failed");
                        }
                    }
                },
                Some(button),
                ListenerOptions::default(),
            );
        }
        Ok(())
    }
}

impl Component for ThemeSwitcher {
    fn name(&self) -> &'static str {
        "ThemeSwitcher"
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ElementContext;
    use loom_dom::{Document, Dom, EventLoop};

    const MARKUP: &str = r#"
        <ui-component-preview>
          <button data-tab data-theme="meanjin">Meanjin</button>
          <button data-tab data-theme="naarm">Naarm</button>
          <button data-tab data-theme="sydney">Unknown</button>
          <section data-tab="naarm">Preview</section>
        </ui-component-preview>"#;

    fn mounted(markup: &str) -> Rc<ThemeSwitcher> {
        let mut document = Document::new();
        let body = document.body();
        let nodes = document.append_html(body, markup).unwrap();
        let context = ElementContext::with_timeline(Dom::new(document), EventLoop::new());
        let switcher = Rc::new(ThemeSwitcher::new(Host::new(nodes[0], context)));
        switcher.clone().mount().unwrap();
        switcher
    }

    #[test]
    fn test_initial_theme_from_panel() {
        let switcher = mounted(MARKUP);
        assert_eq!(switcher.theme(), Theme::Naarm);
        let dom = switcher.host.dom().borrow();
        assert!(dom.has_class(switcher.host.element(), "theme-naarm"));
        assert_eq!(dom.get_attribute(switcher.host.element(), "data-tab"), Some("naarm"));
    }

    #[test]
    fn test_defaults_to_gadigal() {
        let switcher = mounted(r#"<ui-theme-switcher><div data-tab=""></div></ui-theme-switcher>"#);
        assert_eq!(switcher.theme(), Theme::Gadigal);
    }

    #[test]
    fn test_buttons_switch_theme_and_emit() {
        let switcher = mounted(MARKUP);
        let dom = switcher.host.dom().clone();
        let element = switcher.host.element();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = seen.clone();
        dom.add_event_listener(
            element,
            STATE_CHANGE_EVENT,
            move |event: &Event| log.borrow_mut().push(event.detail().map(str::to_string)),
            ListenerOptions::default(),
        );

        let buttons = dom.borrow().query_selector_all(element, "button").unwrap();
        dom.dispatch_event(buttons[0], &Event::bubbling("click"));
        assert_eq!(switcher.theme(), Theme::Meanjin);
        {
            let document = dom.borrow();
            assert!(document.has_class(element, "theme-meanjin"));
            assert!(!document.has_class(element, "theme-naarm"));
        }

        dom.dispatch_event(buttons[2], &Event::bubbling("click"));
        assert_eq!(switcher.theme(), Theme::Meanjin);
        assert_eq!(*seen.borrow(), vec![Some("meanjin".to_string())]);
    }

    #[test]
    fn test_missing_panel() {
        let mut document = Document::new();
        let body = document.body();
        let nodes = document
            .append_html(body, "<ui-theme-switcher><button data-tab></button></ui-theme-switcher>")
            .unwrap();
        let context = ElementContext::with_timeline(Dom::new(document), EventLoop::new());
        let switcher = Rc::new(ThemeSwitcher::new(Host::new(nodes[0], context)));
        assert!(matches!(switcher.mount(), Err(ElementError::MissingPart { .. })));
    }
}
