//! Persistence collaborators.
//!
//! The engine reads and writes rows only through these traits. Every
//! check-then-write sequence in the crate (conflict check + insert,
//! availability check + allocation, status transition) runs while holding
//! `&mut` to the store, so a host that hands out the store behind a mutex
//! or inside a database transaction gets the serialization it needs for
//! free. Implementations map their own failures to
//! [`EngineError::Internal`](crate::error::EngineError::Internal).

use crate::error::{EngineError, Result};
use crate::filter::EventFilter;
use crate::model::{
    AllocationId, AllocationStatus, EventId, EventTemplate, NewAllocation, NewEvent, Resource,
    ResourceAllocation, ResourceId, Venue, VenueId,
};

pub trait EventStore {
    fn event(&self, id: EventId) -> Result<Option<EventTemplate>>;

    /// Rows matching `filter`, in insertion order.
    fn events(&self, filter: &EventFilter) -> Result<Vec<EventTemplate>>;

    fn insert_event(&mut self, draft: NewEvent) -> Result<EventTemplate>;

    fn set_event_approval(&mut self, id: EventId, approved: bool) -> Result<EventTemplate>;

    fn require_event(&self, id: EventId) -> Result<EventTemplate> {
        self.event(id)?.ok_or(EngineError::NotFound { entity: "event", id })
    }
}

pub trait VenueStore {
    fn venue(&self, id: VenueId) -> Result<Option<Venue>>;

    fn delete_venue(&mut self, id: VenueId) -> Result<()>;

    fn require_venue(&self, id: VenueId) -> Result<Venue> {
        self.venue(id)?.ok_or(EngineError::NotFound { entity: "venue", id })
    }
}

pub trait ResourceStore {
    fn resource(&self, id: ResourceId) -> Result<Option<Resource>>;

    /// Every allocation ever made against `resource_id`, terminal ones
    /// included.
    fn allocations_for(&self, resource_id: ResourceId) -> Result<Vec<ResourceAllocation>>;

    fn allocation(&self, id: AllocationId) -> Result<Option<ResourceAllocation>>;

    /// Persist a new allocation in the `PENDING` state.
    fn insert_allocation(&mut self, request: NewAllocation) -> Result<ResourceAllocation>;

    fn set_allocation_status(
        &mut self,
        id: AllocationId,
        status: AllocationStatus,
    ) -> Result<ResourceAllocation>;

    fn require_resource(&self, id: ResourceId) -> Result<Resource> {
        self.resource(id)?.ok_or(EngineError::NotFound {
            entity: "resource",
            id,
        })
    }

    fn require_allocation(&self, id: AllocationId) -> Result<ResourceAllocation> {
        self.allocation(id)?.ok_or(EngineError::NotFound {
            entity: "allocation",
            id,
        })
    }
}
