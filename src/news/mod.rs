//! Economic news blackout tracking
//!
//! Converts a day's high-impact economic events into absolute blackout
//! intervals and answers "is it safe to trade now" / "when does the next
//! safe window begin". The calendar data source is an extension point.

mod events;
mod tracker;

pub use events::{classify_impact, EconomicEvent, Impact, HIGH_IMPACT_KEYWORDS};
pub use tracker::{
    BlackoutPeriod, CalendarSource, NewsBlackoutTracker, StaticCalendarSource, WeeklyOutlook,
};
