//! Stored rows consumed from the persistence layer, and the drafts used to
//! create new ones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::TimeOfDay;

pub type EventId = i64;
pub type VenueId = i64;
pub type ResourceId = i64;
pub type AllocationId = i64;
pub type UserId = i64;

// ── Events ──────────────────────────────────────────────────────────────────

/// Urgency tier an organizer attaches to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    Low,
    #[default]
    Normal,
    High,
    Emergency,
}

/// How a recurring template repeats from its anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
}

/// Recurrence attached to a template. A template without one is a single
/// occurrence on its anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    /// Last date (inclusive) on which the series may produce an occurrence.
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn weekly() -> Self {
        RecurrenceRule {
            kind: RecurrenceKind::Weekly,
            until: None,
        }
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizerRole {
    PrimaryOrganizer,
    CoOrganizer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    pub user_id: UserId,
    pub role: OrganizerRole,
}

/// The stored event row backing both one-off and recurring events.
///
/// `date` is the occurrence itself for a one-off event and the first
/// occurrence (the anchor) for a recurring one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub venue_id: VenueId,
    pub capacity: u32,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub priority: PriorityTier,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub organizers: Vec<Organizer>,
}

impl EventTemplate {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn primary_organizer(&self) -> Option<UserId> {
        self.organizers
            .iter()
            .find(|o| o.role == OrganizerRole::PrimaryOrganizer)
            .map(|o| o.user_id)
    }
}

/// Fields supplied by an organizer when creating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub venue_id: VenueId,
    pub capacity: u32,
    #[serde(default)]
    pub priority: PriorityTier,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub organizers: Vec<Organizer>,
}

impl NewEvent {
    /// The stored row this draft becomes once the store assigns `id`.
    /// New events always start unapproved.
    pub fn into_template(self, id: EventId) -> EventTemplate {
        EventTemplate {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            venue_id: self.venue_id,
            capacity: self.capacity,
            approved: false,
            priority: self.priority,
            category: self.category,
            recurrence: self.recurrence,
            organizers: self.organizers,
        }
    }
}

// ── Venues ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub capacity: u32,
}

// ── Resources ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceCategory {
    AudioVisual,
    Furniture,
    TechnicalStaff,
    Catering,
    Transportation,
    Security,
    Other,
}

/// A finite shared supply (projectors, chairs, staff hours).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub category: ResourceCategory,
    pub total_count: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Lifecycle of a resource allocation.
///
/// ```text
/// PENDING ──► APPROVED ──► CANCELLED
///    │
///    ├──────► DENIED
///    └──────► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Pending,
    Approved,
    Denied,
    Cancelled,
}

impl AllocationStatus {
    /// Whether an allocation in this state holds supply.
    pub fn reserves_supply(self) -> bool {
        matches!(self, AllocationStatus::Pending | AllocationStatus::Approved)
    }

    pub fn is_terminal(self) -> bool {
        !self.reserves_supply()
    }

    pub fn can_transition_to(self, next: AllocationStatus) -> bool {
        use AllocationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Denied) | (Pending, Cancelled) | (Approved, Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub id: AllocationId,
    pub event_id: EventId,
    pub resource_id: ResourceId,
    pub quantity: u32,
    pub status: AllocationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// An organizer's request to commit some of a resource to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAllocation {
    pub event_id: EventId,
    pub resource_id: ResourceId,
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
}
