//! Built-in components.

mod accordion;
mod animated;
mod date_picker;
mod fallback;
mod theme_switcher;

pub use accordion::{Accordion, AccordionState};
pub use animated::AnimatedContainer;
pub use date_picker::{
    CalendarDate, DatePicker, PickerState, SELECT_EVENT, days_in_month, month_name,
};
pub use fallback::{Fallback, LoadState};
pub use theme_switcher::{Theme, ThemeSwitcher};
