//! Resource availability ledger.
//!
//! A resource's supply is held by every allocation in a non-terminal state
//! (`PENDING` or `APPROVED`). Availability is recomputed from the
//! allocation rows on every request, and the ledger refuses any request or
//! transition that would leave it below zero. Denying or cancelling an
//! allocation releases its quantity at once and cannot be undone.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::model::{
    AllocationId, AllocationStatus, NewAllocation, Resource, ResourceAllocation, ResourceId,
};
use crate::store::{EventStore, ResourceStore};

/// Supply and commitment of one resource at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub resource_id: ResourceId,
    pub total: u32,
    /// Sum of quantities over `PENDING` and `APPROVED` allocations.
    pub allocated: u64,
    /// `total - allocated`. Only negative when supply was reduced below
    /// what is already committed.
    pub available: i64,
}

impl Availability {
    pub fn can_take(&self, quantity: u32) -> bool {
        quantity > 0 && i64::from(quantity) <= self.available
    }
}

/// Answer to "may this much be requested", with the reason when not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationCheck {
    pub allowed: bool,
    pub availability: Availability,
    pub reason: Option<String>,
}

/// Tally `allocations` against `resource`.
pub fn tally<'a>(
    resource: &Resource,
    allocations: impl IntoIterator<Item = &'a ResourceAllocation>,
) -> Availability {
    let allocated: u64 = allocations
        .into_iter()
        .filter(|a| a.resource_id == resource.id && a.status.reserves_supply())
        .map(|a| u64::from(a.quantity))
        .sum();
    Availability {
        resource_id: resource.id,
        total: resource.total_count,
        allocated,
        available: i64::from(resource.total_count) - allocated as i64,
    }
}

pub fn availability<S: ResourceStore + ?Sized>(
    store: &S,
    resource_id: ResourceId,
) -> Result<Availability> {
    let resource = store.require_resource(resource_id)?;
    let allocations = store.allocations_for(resource_id)?;
    Ok(tally(&resource, &allocations))
}

fn check_against(resource: &Resource, availability: Availability, quantity: u32) -> AllocationCheck {
    let reason = if quantity == 0 {
        Some("quantity must be at least 1".to_string())
    } else if !resource.active {
        Some(format!("resource '{}' is not active", resource.name))
    } else if !availability.can_take(quantity) {
        Some(format!(
            "requested {quantity} of '{}' but only {} available",
            resource.name,
            availability.available.max(0)
        ))
    } else {
        None
    };
    AllocationCheck {
        allowed: reason.is_none(),
        availability,
        reason,
    }
}

/// Whether `quantity` of `resource_id` could be requested right now.
pub fn can_allocate<S: ResourceStore + ?Sized>(
    store: &S,
    resource_id: ResourceId,
    quantity: u32,
) -> Result<AllocationCheck> {
    let resource = store.require_resource(resource_id)?;
    let current = tally(&resource, &store.allocations_for(resource_id)?);
    Ok(check_against(&resource, current, quantity))
}

/// Record a `PENDING` allocation, or reject it without clamping.
///
/// Fails with `Validation` for a zero quantity or an inactive resource,
/// `NotFound` for an unknown event or resource, and `Conflict` when the
/// request exceeds what is currently available.
pub fn allocate<S: EventStore + ResourceStore + ?Sized>(
    store: &mut S,
    request: NewAllocation,
) -> Result<ResourceAllocation> {
    if request.quantity == 0 {
        return Err(EngineError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    store.require_event(request.event_id)?;
    let resource = store.require_resource(request.resource_id)?;
    if !resource.active {
        return Err(EngineError::Validation(format!(
            "resource '{}' is not active",
            resource.name
        )));
    }

    let current = tally(&resource, &store.allocations_for(resource.id)?);
    let check = check_against(&resource, current, request.quantity);
    if !check.allowed {
        warn!(
            resource_id = resource.id,
            requested = request.quantity,
            available = current.available,
            "allocation rejected"
        );
        return Err(EngineError::conflict(
            check
                .reason
                .unwrap_or_else(|| "insufficient supply".to_string()),
            format!("resource {}", resource.id),
        ));
    }

    let allocation = store.insert_allocation(request)?;
    info!(
        allocation_id = allocation.id,
        resource_id = resource.id,
        event_id = allocation.event_id,
        quantity = allocation.quantity,
        remaining = current.available - i64::from(allocation.quantity),
        "allocation recorded"
    );
    Ok(allocation)
}

/// Move an allocation through its lifecycle.
///
/// `PENDING → APPROVED` leaves availability unchanged but is refused when
/// the resource is already oversubscribed. `DENIED` and `CANCELLED` release
/// the allocation's quantity and are final.
pub fn set_status<S: ResourceStore + ?Sized>(
    store: &mut S,
    allocation_id: AllocationId,
    status: AllocationStatus,
) -> Result<ResourceAllocation> {
    let allocation = store.require_allocation(allocation_id)?;
    if !allocation.status.can_transition_to(status) {
        return Err(EngineError::Validation(format!(
            "allocation {allocation_id} cannot move from {:?} to {:?}",
            allocation.status, status
        )));
    }

    if status.reserves_supply() {
        let resource = store.require_resource(allocation.resource_id)?;
        let current = tally(&resource, &store.allocations_for(resource.id)?);
        if current.available < 0 {
            warn!(
                allocation_id,
                resource_id = resource.id,
                available = current.available,
                "approval refused on oversubscribed resource"
            );
            return Err(EngineError::conflict(
                format!(
                    "'{}' is oversubscribed by {}",
                    resource.name, -current.available
                ),
                format!("resource {}", resource.id),
            ));
        }
    }

    let updated = store.set_allocation_status(allocation_id, status)?;
    if status.is_terminal() {
        info!(
            allocation_id,
            resource_id = updated.resource_id,
            released = updated.quantity,
            status = ?status,
            "allocation released"
        );
    } else {
        debug!(allocation_id, status = ?status, "allocation status changed");
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use crate::model::{EventTemplate, PriorityTier, ResourceCategory};
    use chrono::NaiveDate;

    fn projector(total: u32) -> Resource {
        Resource {
            id: 1,
            name: "Projector".into(),
            category: ResourceCategory::AudioVisual,
            total_count: total,
            active: true,
        }
    }

    fn seminar() -> EventTemplate {
        EventTemplate {
            id: 100,
            title: "Seminar".into(),
            description: "Guest lecture".into(),
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            start_time: "14:00".parse().unwrap(),
            end_time: "16:00".parse().unwrap(),
            venue_id: 1,
            capacity: 80,
            approved: true,
            priority: PriorityTier::Normal,
            category: "academic".into(),
            recurrence: None,
            organizers: vec![],
        }
    }

    fn store_with(total: u32) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_resource(projector(total));
        store.put_event(seminar());
        store
    }

    fn request(quantity: u32) -> NewAllocation {
        NewAllocation {
            event_id: 100,
            resource_id: 1,
            quantity,
            notes: None,
        }
    }

    #[test]
    fn test_tally_counts_only_active_allocations() {
        let allocations = [
            (1, 2, AllocationStatus::Pending),
            (2, 1, AllocationStatus::Approved),
            (3, 4, AllocationStatus::Denied),
            (4, 3, AllocationStatus::Cancelled),
        ]
        .map(|(id, quantity, status)| ResourceAllocation {
            id,
            event_id: 100,
            resource_id: 1,
            quantity,
            status,
            notes: None,
        });
        let a = tally(&projector(5), &allocations);
        assert_eq!(a.allocated, 3);
        assert_eq!(a.available, 2);
    }

    #[test]
    fn test_fill_to_zero_then_reject() {
        let mut store = store_with(5);
        let big = allocate(&mut store, request(3)).unwrap();
        allocate(&mut store, request(2)).unwrap();
        assert_eq!(availability(&store, 1).unwrap().available, 0);

        let err = allocate(&mut store, request(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("only 0 available"), "got: {err}");

        set_status(&mut store, big.id, AllocationStatus::Denied).unwrap();
        assert_eq!(availability(&store, 1).unwrap().available, 3);
    }

    #[test]
    fn test_request_is_not_clamped() {
        let mut store = store_with(2);
        assert!(allocate(&mut store, request(3)).is_err());
        assert!(store.allocations_for(1).unwrap().is_empty());
    }

    #[test]
    fn test_can_allocate_reports_reason() {
        let mut store = store_with(2);
        allocate(&mut store, request(2)).unwrap();
        let check = can_allocate(&store, 1, 1).unwrap();
        assert!(!check.allowed);
        assert_eq!(check.availability.available, 0);
        assert!(check.reason.is_some());

        let store = store_with(2);
        let check = can_allocate(&store, 1, 2).unwrap();
        assert!(check.allowed);
        assert_eq!(check.reason, None);
    }

    #[test]
    fn test_approval_keeps_availability() {
        let mut store = store_with(4);
        let a = allocate(&mut store, request(3)).unwrap();
        set_status(&mut store, a.id, AllocationStatus::Approved).unwrap();
        assert_eq!(availability(&store, 1).unwrap().available, 1);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut store = store_with(4);
        let a = allocate(&mut store, request(1)).unwrap();
        set_status(&mut store, a.id, AllocationStatus::Cancelled).unwrap();
        for next in [
            AllocationStatus::Pending,
            AllocationStatus::Approved,
            AllocationStatus::Denied,
        ] {
            let err = set_status(&mut store, a.id, next).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_approved_cannot_be_denied_but_can_be_cancelled() {
        let mut store = store_with(4);
        let a = allocate(&mut store, request(2)).unwrap();
        set_status(&mut store, a.id, AllocationStatus::Approved).unwrap();
        assert!(set_status(&mut store, a.id, AllocationStatus::Denied).is_err());
        set_status(&mut store, a.id, AllocationStatus::Cancelled).unwrap();
        assert_eq!(availability(&store, 1).unwrap().available, 4);
    }

    #[test]
    fn test_approval_refused_when_supply_shrank() {
        let mut store = store_with(4);
        let a = allocate(&mut store, request(3)).unwrap();
        store.insert_resource(projector(2));
        let err = set_status(&mut store, a.id, AllocationStatus::Approved).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Releasing is always allowed.
        set_status(&mut store, a.id, AllocationStatus::Cancelled).unwrap();
    }

    #[test]
    fn test_unknown_references() {
        let mut store = store_with(4);
        let mut bad = request(1);
        bad.event_id = 999;
        assert_eq!(allocate(&mut store, bad).unwrap_err().kind(), ErrorKind::NotFound);
        let mut bad = request(1);
        bad.resource_id = 999;
        assert_eq!(allocate(&mut store, bad).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            set_status(&mut store, 42, AllocationStatus::Approved)
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_zero_quantity_and_inactive_resource() {
        let mut store = store_with(4);
        assert_eq!(allocate(&mut store, request(0)).unwrap_err().kind(), ErrorKind::Validation);

        let mut retired = projector(4);
        retired.active = false;
        store.insert_resource(retired);
        assert_eq!(allocate(&mut store, request(1)).unwrap_err().kind(), ErrorKind::Validation);
    }
}
