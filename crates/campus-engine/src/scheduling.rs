//! Event creation, approval, and venue removal.
//!
//! Creation validates in a fixed order and stops at the first failure:
//!
//! 1. required fields (title, description, category, capacity, time span,
//!    exactly one primary organizer)
//! 2. venue existence
//! 3. event capacity against venue capacity
//! 4. venue time conflict with approved events
//! 5. description length
//!
//! so an over-capacity request is rejected before any conflict lookup runs.

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::conflict::{check_venue, BookingSlot};
use crate::error::{EngineError, Result};
use crate::filter::EventFilter;
use crate::model::{EventId, EventTemplate, NewEvent, OrganizerRole, VenueId};
use crate::store::{EventStore, VenueStore};

fn check_required_fields(draft: &NewEvent) -> Result<()> {
    let mut missing = Vec::new();
    if draft.title.trim().is_empty() {
        missing.push("title");
    }
    if draft.description.trim().is_empty() {
        missing.push("description");
    }
    if draft.category.trim().is_empty() {
        missing.push("category");
    }
    if !missing.is_empty() {
        return Err(EngineError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    if draft.capacity == 0 {
        return Err(EngineError::Validation(
            "capacity must be greater than zero".to_string(),
        ));
    }
    if draft.end_time <= draft.start_time {
        return Err(EngineError::Validation(format!(
            "end time {} must be after start time {}",
            draft.end_time, draft.start_time
        )));
    }
    if let Some(until) = draft.recurrence.and_then(|rule| rule.until) {
        if until < draft.date {
            return Err(EngineError::Validation(format!(
                "recurrence ends {until}, before the first occurrence {}",
                draft.date
            )));
        }
    }

    let primaries = draft
        .organizers
        .iter()
        .filter(|o| o.role == OrganizerRole::PrimaryOrganizer)
        .count();
    if primaries != 1 {
        return Err(EngineError::Validation(format!(
            "an event needs exactly one primary organizer, found {primaries}"
        )));
    }
    Ok(())
}

/// Run every creation check against `draft` without writing anything.
///
/// The venue conflict check covers the draft's own date only. For a
/// recurring draft that is the anchor date: later instances are not checked
/// against approved events, and approved recurring series block nothing
/// beyond their stored date. Hosts that need series-wide exclusivity must
/// expand both sides themselves.
pub fn validate_new_event<S: EventStore + VenueStore + ?Sized>(
    store: &S,
    draft: &NewEvent,
    config: &EngineConfig,
) -> Result<()> {
    check_required_fields(draft)?;

    let venue = store.require_venue(draft.venue_id)?;

    if draft.capacity > venue.capacity {
        return Err(EngineError::Validation(format!(
            "event capacity {} exceeds capacity {} of venue '{}'",
            draft.capacity, venue.capacity, venue.name
        )));
    }

    let check = check_venue(store, &BookingSlot::from(draft), None)?;
    if let Some(existing) = check.conflicting_event_id {
        warn!(venue_id = venue.id, date = %draft.date, existing, "rejected double booking");
        return Err(EngineError::Conflict {
            reason: check
                .reason
                .unwrap_or_else(|| format!("venue {} is already booked", venue.id)),
            entity: Some(format!("event {existing}")),
        });
    }

    let words = draft.description.split_whitespace().count();
    if words > config.description_word_limit {
        return Err(EngineError::Validation(format!(
            "description has {words} words, limit is {}",
            config.description_word_limit
        )));
    }
    Ok(())
}

/// Validate and store a new event. It starts unapproved.
pub fn create_event<S: EventStore + VenueStore + ?Sized>(
    store: &mut S,
    draft: NewEvent,
    config: &EngineConfig,
) -> Result<EventTemplate> {
    validate_new_event(&*store, &draft, config)?;
    let event = store.insert_event(draft)?;
    info!(
        event_id = event.id,
        venue_id = event.venue_id,
        date = %event.date,
        recurring = event.is_recurring(),
        "event created"
    );
    Ok(event)
}

/// Approve an event. Approval makes it block its venue, so the venue is
/// checked again against events approved since it was created.
pub fn approve_event<S: EventStore + ?Sized>(store: &mut S, id: EventId) -> Result<EventTemplate> {
    let event = store.require_event(id)?;
    if event.approved {
        return Ok(event);
    }

    let check = check_venue(&*store, &BookingSlot::from(&event), Some(id))?;
    if let Some(existing) = check.conflicting_event_id {
        warn!(event_id = id, existing, "approval blocked by venue conflict");
        return Err(EngineError::Conflict {
            reason: check
                .reason
                .unwrap_or_else(|| format!("venue {} is already booked", event.venue_id)),
            entity: Some(format!("event {existing}")),
        });
    }

    let approved = store.set_event_approval(id, true)?;
    info!(event_id = id, "event approved");
    Ok(approved)
}

/// Fail with a conflict when any event still references `venue_id`.
pub fn ensure_venue_unreferenced<S: EventStore + ?Sized>(store: &S, venue_id: VenueId) -> Result<()> {
    match store.events(&EventFilter::Venue(venue_id))?.first() {
        Some(event) => Err(EngineError::conflict(
            format!(
                "venue {venue_id} is still used by event {} ('{}')",
                event.id, event.title
            ),
            format!("event {}", event.id),
        )),
        None => Ok(()),
    }
}

pub fn delete_venue<S: EventStore + VenueStore + ?Sized>(store: &mut S, venue_id: VenueId) -> Result<()> {
    store.require_venue(venue_id)?;
    ensure_venue_unreferenced(&*store, venue_id)?;
    store.delete_venue(venue_id)?;
    info!(venue_id, "venue deleted");
    Ok(())
}
