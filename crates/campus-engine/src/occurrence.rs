//! Occurrence materialization.
//!
//! An [`EventOccurrence`] is what calendar views list: either a stored
//! one-off event as-is, or a virtual instance projected from a recurring
//! template onto one date. Instances are never persisted and carry an
//! [`OccurrenceId`] derived from `(template id, date)`.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::clock::TimeOfDay;
use crate::model::{
    EventId, EventTemplate, Organizer, PriorityTier, RecurrenceRule, VenueId,
};

/// Multiplier that places instance integer keys above every natural id.
const INSTANCE_KEY_BASE: i64 = 1_000_000_000_000;

// ── OccurrenceId ────────────────────────────────────────────────────────────

/// Identifier of a listed occurrence.
///
/// Stored events keep their natural id. Materialized instances use a
/// composite key, so the two spaces are disjoint by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OccurrenceId {
    Stored(EventId),
    Instance {
        template_id: EventId,
        date: NaiveDate,
    },
}

impl OccurrenceId {
    /// Single-integer form for hosts whose storage needs one.
    ///
    /// Instances encode as `template_id * 10^12 + YYYYMMDD`, which is at
    /// least `10^12` for any positive template id and so never equals a
    /// natural id below that bound. Returns `None` where the encoding would
    /// overflow or the template id is not positive, instead of colliding.
    pub fn integer_key(&self) -> Option<i64> {
        match *self {
            OccurrenceId::Stored(id) => Some(id),
            OccurrenceId::Instance { template_id, date } => {
                if template_id <= 0 || date.year() < 0 || date.year() > 9999 {
                    return None;
                }
                let ymd = i64::from(date.year()) * 10_000
                    + i64::from(date.month()) * 100
                    + i64::from(date.day());
                template_id
                    .checked_mul(INSTANCE_KEY_BASE)
                    .and_then(|base| base.checked_add(ymd))
            }
        }
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceId::Stored(id) => write!(f, "{id}"),
            OccurrenceId::Instance { template_id, date } => {
                write!(f, "{template_id}@{}", date.format("%Y-%m-%d"))
            }
        }
    }
}

impl Serialize for OccurrenceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OccurrenceId::Stored(id) => serializer.serialize_i64(*id),
            OccurrenceId::Instance { .. } => serializer.collect_str(self),
        }
    }
}

// ── EventOccurrence ─────────────────────────────────────────────────────────

/// A concrete dated event as presented to calendar views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOccurrence {
    pub id: OccurrenceId,
    pub parent_event_id: Option<EventId>,
    pub is_recurring_instance: bool,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub venue_id: VenueId,
    pub capacity: u32,
    pub approved: bool,
    pub priority: PriorityTier,
    pub category: String,
    pub recurrence: Option<RecurrenceRule>,
    pub organizers: Vec<Organizer>,
}

impl EventOccurrence {
    /// The stored row itself, under its natural id.
    pub fn from_stored(template: &EventTemplate) -> Self {
        Self::project(template, OccurrenceId::Stored(template.id), None, template.date)
    }

    /// `(series id, date)`: the pair no assembled listing may repeat.
    pub fn series_key(&self) -> (EventId, NaiveDate) {
        match self.id {
            OccurrenceId::Stored(id) => (id, self.date),
            OccurrenceId::Instance { template_id, date } => (template_id, date),
        }
    }

    fn project(
        template: &EventTemplate,
        id: OccurrenceId,
        parent_event_id: Option<EventId>,
        date: NaiveDate,
    ) -> Self {
        EventOccurrence {
            id,
            parent_event_id,
            is_recurring_instance: parent_event_id.is_some(),
            title: template.title.clone(),
            description: template.description.clone(),
            date,
            start_time: template.start_time,
            end_time: template.end_time,
            venue_id: template.venue_id,
            capacity: template.capacity,
            approved: template.approved,
            priority: template.priority,
            category: template.category.clone(),
            recurrence: template.recurrence,
            organizers: template.organizers.clone(),
        }
    }
}

/// Project a recurring template onto `date`.
///
/// Every field is copied from the template except the date, and the
/// instance points back at the template through `parent_event_id`.
pub fn materialize(template: &EventTemplate, date: NaiveDate) -> EventOccurrence {
    EventOccurrence::project(
        template,
        OccurrenceId::Instance {
            template_id: template.id,
            date,
        },
        Some(template.id),
        date,
    )
}
