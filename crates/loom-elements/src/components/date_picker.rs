//! Date picker shell: a popup part and two inputs kept in sync with the
//! selected date.
//!
//! Required parts: `[data-date-picker]`, `[data-date-input]` and
//! `[data-month-input]`. Optional `min-date` / `max-date` attributes on the
//! host bound selection (`YYYY-MM-DD`).

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use loom_dom::{Event, ListenerOptions, NodeId};
use tracing::{debug, trace, warn};

use crate::STATE_CHANGE_EVENT;
use crate::error::{ElementError, Result};
use crate::host::Host;
use crate::traits::{Component, ContentResolver, Hosted, Lifecycle, ListenerOwner};

pub const SELECT_EVENT: &str = "select";

/// A validated calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    year: i32,
    month: u32,
    day: u32,
}

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(ElementError::InvalidDate { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    /// Parse `YYYY-MM-DD`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().splitn(3, '-');
        let year = parts.next()?.parse().ok()?;
        let month = parts.next()?.parse().ok()?;
        let day = parts.next()?.parse().ok()?;
        Self::new(year, month, day).ok()
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn day(self) -> u32 {
        self.day
    }

    /// `YYYY-MM-DD`
    pub fn to_iso_string(self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// `<Month> YYYY`
    pub fn month_label(self) -> String {
        format!("{} {:04}", month_name(self.month), self.year)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerState {
    Open,
    #[default]
    Closed,
}

impl PickerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Parts {
    picker: NodeId,
    date_input: NodeId,
    month_input: NodeId,
}

pub struct DatePicker {
    host: Host,
    state: Cell<PickerState>,
    selected: Cell<Option<CalendarDate>>,
    parts: Cell<Option<Parts>>,
}

impl DatePicker {
    pub const TAG: &'static str = "ui-date-picker";

    pub fn new(host: Host) -> Self {
        Self {
            host,
            state: Cell::new(PickerState::Closed),
            selected: Cell::new(None),
            parts: Cell::new(None),
        }
    }

    pub fn state(&self) -> PickerState {
        self.state.get()
    }

    pub fn selected(&self) -> Option<CalendarDate> {
        self.selected.get()
    }

    fn part(&self, selector: &str, part: &'static str) -> Result<NodeId> {
        self.host
            .dom()
            .borrow()
            .query_selector(self.host.element(), selector)?
            .ok_or(ElementError::MissingPart {
                component: Self::TAG,
                part,
            })
    }

    fn parts(&self) -> Result<Parts> {
        if let Some(parts) = self.parts.get() {
            return Ok(parts);
        }
        let parts = Parts {
            picker: self.part("[data-date-picker]", "date picker")?,
            date_input: self.part("[data-date-input]", "date input")?,
            month_input: self.part("[data-month-input]", "month input")?,
        };
        self.parts.set(Some(parts));
        Ok(parts)
    }

    fn bound(&self, name: &str) -> Option<CalendarDate> {
        let value = self.host.attribute(name)?;
        let date = CalendarDate::parse(&value);
        if date.is_none() {
            trace!(attribute = name, %value, "ignoring unparseable date bound");
        }
        date
    }

    fn write_state(&self, state: PickerState) -> Result<()> {
        self.state.set(state);
        let parts = self.parts()?;
        let value = state.as_str();
        let mut document = self.host.dom().borrow_mut();
        for node in [
            self.host.element(),
            parts.picker,
            parts.date_input,
            parts.month_input,
        ] {
            document.set_attribute(node, "data-state", value)?;
        }
        Ok(())
    }

    fn change_state(&self, state: PickerState) -> Result<()> {
        if self.state.get() == state {
            return Ok(());
        }
        self.write_state(state)?;
        self.host.emit(STATE_CHANGE_EVENT, state.as_str());
        Ok(())
    }

    pub fn open(&self) -> Result<()> {
        self.change_state(PickerState::Open)
    }

    pub fn close(&self) -> Result<()> {
        self.change_state(PickerState::Closed)
    }

    pub fn toggle(&self) -> Result<()> {
        match self.state.get() {
            PickerState::Open => self.close(),
            PickerState::Closed => self.open(),
        }
    }

    /// Select a day, fill both inputs, close and emit `select`.
    pub fn select_date(&self, year: i32, month: u32, day: u32) -> Result<CalendarDate> {
        let date = CalendarDate::new(year, month, day)?;
        let too_early = self.bound("min-date").is_some_and(|min| date < min);
        let too_late = self.bound("max-date").is_some_and(|max| date > max);
        if too_early || too_late {
            return Err(ElementError::DateOutOfRange {
                date: date.to_iso_string(),
            });
        }

        let parts = self.parts()?;
        {
            let mut document = self.host.dom().borrow_mut();
            document.set_attribute(parts.date_input, "value", date.to_iso_string())?;
            document.set_attribute(parts.month_input, "value", date.month_label())?;
        }
        self.selected.set(Some(date));
        debug!(element = %self.host.element(), %date, "date selected");
        self.close()?;
        self.host.emit(SELECT_EVENT, &date.to_iso_string());
        Ok(date)
    }
}

impl Hosted for DatePicker {
    fn host(&self) -> &Host {
        &self.host
    }
}

impl ListenerOwner for DatePicker {}
impl ContentResolver for DatePicker {}

impl Lifecycle for DatePicker {
    fn mount(self: Rc<Self>) -> Result<()> {
        let parts = self.parts()?;
        self.write_state(PickerState::Closed)?;

        let preset = self
            .host
            .dom()
            .borrow()
            .get_attribute(parts.date_input, "value")
            .and_then(CalendarDate::parse);
        self.selected.set(preset);

        let this = Rc::downgrade(&self);
        self.attach_trigger_listener(
            move |event: &Event| {
                event.prevent_default();
                if let Some(this) = this.upgrade() {
                    if let Err(error) = this.toggle() {
                        warn!(%error, "date picker toggle failed");
                    }
                }
            },
            None,
            ListenerOptions::default(),
        )?;
        Ok(())
    }
}

impl Component for DatePicker {
    fn name(&self) -> &'static str {
        "DatePicker"
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
