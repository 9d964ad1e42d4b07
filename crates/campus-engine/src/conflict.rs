//! Venue double-booking detection.
//!
//! Two bookings conflict when they are at the same venue on the same date
//! and their half-open time intervals `[start, end)` overlap. Back-to-back
//! bookings (one ending exactly when the next starts) do not conflict.
//! Only approved events block a venue; pending requests never do.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::TimeOfDay;
use crate::error::Result;
use crate::filter::{and, EventFilter};
use crate::model::{EventId, EventTemplate, NewEvent, VenueId};
use crate::store::EventStore;

/// The venue, date, and time span a new or changed event wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSlot {
    pub venue_id: VenueId,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl From<&EventTemplate> for BookingSlot {
    fn from(event: &EventTemplate) -> Self {
        BookingSlot {
            venue_id: event.venue_id,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
        }
    }
}

impl From<&NewEvent> for BookingSlot {
    fn from(draft: &NewEvent) -> Self {
        BookingSlot {
            venue_id: draft.venue_id,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
        }
    }
}

/// Outcome of a venue check, ready to hand back to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictCheck {
    pub conflict: bool,
    pub conflicting_event_id: Option<EventId>,
    pub reason: Option<String>,
}

impl ConflictCheck {
    fn clear() -> Self {
        ConflictCheck {
            conflict: false,
            conflicting_event_id: None,
            reason: None,
        }
    }

    fn blocked_by(slot: &BookingSlot, existing: &EventTemplate) -> Self {
        ConflictCheck {
            conflict: true,
            conflicting_event_id: Some(existing.id),
            reason: Some(format!(
                "venue {} is booked on {} from {} to {} by approved event {} ('{}')",
                slot.venue_id,
                slot.date,
                existing.start_time,
                existing.end_time,
                existing.id,
                existing.title
            )),
        }
    }
}

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlaps(
    a_start: TimeOfDay,
    a_end: TimeOfDay,
    b_start: TimeOfDay,
    b_end: TimeOfDay,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// First approved event in `existing` that blocks `slot`.
pub fn find_conflict<'a>(
    slot: &BookingSlot,
    existing: impl IntoIterator<Item = &'a EventTemplate>,
) -> Option<&'a EventTemplate> {
    existing.into_iter().find(|event| {
        event.approved
            && event.venue_id == slot.venue_id
            && event.date == slot.date
            && overlaps(slot.start_time, slot.end_time, event.start_time, event.end_time)
    })
}

pub fn has_conflict<'a>(
    slot: &BookingSlot,
    existing: impl IntoIterator<Item = &'a EventTemplate>,
) -> bool {
    find_conflict(slot, existing).is_some()
}

/// Check `slot` against the approved events in `store`.
///
/// `ignore` excludes one event from the comparison, so an event being
/// approved is never reported as conflicting with itself.
pub fn check_venue<S: EventStore + ?Sized>(
    store: &S,
    slot: &BookingSlot,
    ignore: Option<EventId>,
) -> Result<ConflictCheck> {
    let same_day = store.events(&and([
        EventFilter::Venue(slot.venue_id),
        EventFilter::OnDate(slot.date),
        EventFilter::ApprovedOnly,
    ]))?;

    let candidates = same_day.iter().filter(|e| Some(e.id) != ignore);
    let check = match find_conflict(slot, candidates) {
        Some(existing) => ConflictCheck::blocked_by(slot, existing),
        None => ConflictCheck::clear(),
    };

    debug!(
        venue_id = slot.venue_id,
        date = %slot.date,
        compared = same_day.len(),
        conflict = check.conflict,
        "venue conflict check"
    );
    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::PriorityTier;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn booked(id: i64, venue_id: VenueId, start: &str, end: &str, approved: bool) -> EventTemplate {
        EventTemplate {
            id,
            title: format!("event {id}"),
            description: String::new(),
            date: d(10),
            start_time: t(start),
            end_time: t(end),
            venue_id,
            capacity: 30,
            approved,
            priority: PriorityTier::Normal,
            category: String::new(),
            recurrence: None,
            organizers: vec![],
        }
    }

    fn slot(start: &str, end: &str) -> BookingSlot {
        BookingSlot {
            venue_id: 1,
            date: d(10),
            start_time: t(start),
            end_time: t(end),
        }
    }

    #[test]
    fn test_touching_endpoints_do_not_conflict() {
        let existing = [booked(1, 1, "09:00", "10:00", true)];
        assert!(!has_conflict(&slot("10:00", "11:00"), &existing));
        assert!(!has_conflict(&slot("08:00", "09:00"), &existing));
    }

    #[test]
    fn test_partial_overlap_conflicts() {
        let existing = [booked(1, 1, "09:00", "10:30", true)];
        assert!(has_conflict(&slot("10:00", "11:00"), &existing));
        assert!(has_conflict(&slot("08:00", "09:30"), &existing));
    }

    #[test]
    fn test_containment_conflicts() {
        let existing = [booked(1, 1, "09:00", "17:00", true)];
        assert!(has_conflict(&slot("12:00", "13:00"), &existing));
        let existing = [booked(1, 1, "12:00", "13:00", true)];
        assert!(has_conflict(&slot("09:00", "17:00"), &existing));
    }

    #[test]
    fn test_unapproved_never_blocks() {
        let existing = [booked(1, 1, "09:00", "17:00", false)];
        assert!(!has_conflict(&slot("09:00", "17:00"), &existing));
    }

    #[test]
    fn test_other_venue_or_date_never_blocks() {
        let mut other_day = booked(2, 1, "09:00", "17:00", true);
        other_day.date = d(11);
        let existing = [booked(1, 2, "09:00", "17:00", true), other_day];
        assert!(!has_conflict(&slot("09:00", "17:00"), &existing));
    }

    #[test]
    fn test_check_venue_names_conflicting_event() {
        let mut store = MemoryStore::new();
        store.put_event(booked(7, 1, "09:00", "10:30", true));
        let check = check_venue(&store, &slot("10:00", "11:00"), None).unwrap();
        assert!(check.conflict);
        assert_eq!(check.conflicting_event_id, Some(7));
        assert!(check.reason.unwrap().contains("approved event 7"));
    }

    #[test]
    fn test_check_venue_ignores_self() {
        let mut store = MemoryStore::new();
        let own = booked(7, 1, "09:00", "10:30", true);
        store.put_event(own.clone());
        let check = check_venue(&store, &BookingSlot::from(&own), Some(7)).unwrap();
        assert!(!check.conflict);
        assert_eq!(check.reason, None);
    }
}
