//! Typed predicates over stored event rows.
//!
//! Stores receive an [`EventFilter`] and either evaluate it in memory with
//! [`EventFilter::matches`] or translate it into their own query language.
//! Filters compose through [`and`], [`or`], and [`not`].

use chrono::{NaiveDate, NaiveDateTime};

use crate::clock::{has_concluded, DateWindow, MonthBounds};
use crate::expander::series_intersects;
use crate::model::{EventTemplate, VenueId};

#[derive(Debug, Clone, PartialEq)]
pub enum EventFilter {
    /// Matches every row.
    All,
    /// Stored date inside the window.
    DateRange(DateWindow),
    /// Stored date inside the calendar month.
    Month(MonthBounds),
    /// Stored date equal to the given day.
    OnDate(NaiveDate),
    ApprovedOnly,
    /// Stored date and end time have not yet passed at `now`.
    NotConcluded { now: NaiveDateTime },
    Venue(VenueId),
    /// Whether the row carries a recurrence rule.
    Recurring(bool),
    /// Recurring rows whose series bounds overlap the window.
    SeriesIntersects(DateWindow),
    And(Vec<EventFilter>),
    Or(Vec<EventFilter>),
    Not(Box<EventFilter>),
}

impl EventFilter {
    pub fn matches(&self, event: &EventTemplate) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::DateRange(window) => window.contains(event.date),
            EventFilter::Month(month) => month.window().contains(event.date),
            EventFilter::OnDate(date) => event.date == *date,
            EventFilter::ApprovedOnly => event.approved,
            EventFilter::NotConcluded { now } => !has_concluded(event.date, event.end_time, *now),
            EventFilter::Venue(venue_id) => event.venue_id == *venue_id,
            EventFilter::Recurring(wanted) => event.is_recurring() == *wanted,
            EventFilter::SeriesIntersects(window) => event
                .recurrence
                .as_ref()
                .is_some_and(|rule| series_intersects(event.date, rule, *window)),
            EventFilter::And(parts) => parts.iter().all(|f| f.matches(event)),
            EventFilter::Or(parts) => parts.iter().any(|f| f.matches(event)),
            EventFilter::Not(inner) => !inner.matches(event),
        }
    }

    /// `self AND other`.
    pub fn and(self, other: EventFilter) -> EventFilter {
        and([self, other])
    }

    /// `self OR other`.
    pub fn or(self, other: EventFilter) -> EventFilter {
        or([self, other])
    }
}

/// Conjunction of `filters`. Nested conjunctions are flattened and `All`
/// terms dropped; an empty conjunction is `All`.
pub fn and(filters: impl IntoIterator<Item = EventFilter>) -> EventFilter {
    let mut parts = Vec::new();
    for filter in filters {
        match filter {
            EventFilter::All => {}
            EventFilter::And(inner) => parts.extend(inner),
            other => parts.push(other),
        }
    }
    match parts.len() {
        0 => EventFilter::All,
        1 => parts.remove(0),
        _ => EventFilter::And(parts),
    }
}

/// Disjunction of `filters`. Nested disjunctions are flattened; any `All`
/// term makes the whole disjunction `All`. An empty disjunction matches
/// nothing.
pub fn or(filters: impl IntoIterator<Item = EventFilter>) -> EventFilter {
    let mut parts = Vec::new();
    for filter in filters {
        match filter {
            EventFilter::All => return EventFilter::All,
            EventFilter::Or(inner) => parts.extend(inner),
            other => parts.push(other),
        }
    }
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        EventFilter::Or(parts)
    }
}

pub fn not(filter: EventFilter) -> EventFilter {
    match filter {
        EventFilter::Not(inner) => *inner,
        other => EventFilter::Not(Box::new(other)),
    }
}
