//! Tag name to component factory mapping.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::components::{Accordion, AnimatedContainer, DatePicker, Fallback, ThemeSwitcher};
use crate::error::{ElementError, Result};
use crate::host::Host;
use crate::traits::Component;

/// Builds a component for a freshly connected element.
pub type ComponentFactory = Rc<dyn Fn(Host) -> Rc<dyn Component>>;

fn factory<C, F>(build: F) -> ComponentFactory
where
    C: Component,
    F: Fn(Host) -> C + 'static,
{
    Rc::new(move |host: Host| Rc::new(build(host)) as Rc<dyn Component>)
}

/// Explicit element definitions. Nothing is registered implicitly.
#[derive(Clone, Default)]
pub struct ElementRegistry {
    definitions: BTreeMap<String, ComponentFactory>,
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.definitions.keys()).finish()
    }
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every component this crate ships, under its standard tag names.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let definitions = [
            (Accordion::TAG, factory(Accordion::new)),
            (AnimatedContainer::TAG, factory(AnimatedContainer::new)),
            (ThemeSwitcher::TAG, factory(ThemeSwitcher::new)),
            (ThemeSwitcher::PREVIEW_TAG, factory(ThemeSwitcher::new)),
            (DatePicker::TAG, factory(DatePicker::new)),
            (Fallback::TAG, factory(Fallback::new)),
        ];
        for (tag, factory) in definitions {
            registry.definitions.insert(tag.to_string(), factory);
        }
        registry
    }

    /// Register `factory` for `tag`. Tags are case-insensitive.
    pub fn define<F>(&mut self, tag: &str, factory: F) -> Result<()>
    where
        F: Fn(Host) -> Rc<dyn Component> + 'static,
    {
        let tag = tag.to_ascii_lowercase();
        if self.definitions.contains_key(&tag) {
            return Err(ElementError::AlreadyDefined(tag));
        }
        debug!(%tag, "element defined");
        self.definitions.insert(tag, Rc::new(factory));
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<ComponentFactory> {
        self.definitions.get(&tag.to_ascii_lowercase()).cloned()
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(&tag.to_ascii_lowercase())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}
