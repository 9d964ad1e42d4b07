//! In-memory implementation of the store traits.
//!
//! Backed by ordered maps so listing order is insertion (id) order. A
//! [`Dataset`] is the JSON snapshot form used to seed and persist it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::filter::EventFilter;
use crate::model::{
    AllocationId, AllocationStatus, EventId, EventTemplate, NewAllocation, NewEvent, Resource,
    ResourceAllocation, ResourceId, Venue, VenueId,
};
use crate::store::{EventStore, ResourceStore, VenueStore};

/// Serializable snapshot of every row the engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub venues: Vec<Venue>,
    pub resources: Vec<Resource>,
    pub events: Vec<EventTemplate>,
    pub allocations: Vec<ResourceAllocation>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    venues: BTreeMap<VenueId, Venue>,
    resources: BTreeMap<ResourceId, Resource>,
    events: BTreeMap<EventId, EventTemplate>,
    allocations: BTreeMap<AllocationId, ResourceAllocation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot. Duplicate ids within one table are rejected.
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        Ok(MemoryStore {
            venues: index("venue", dataset.venues, |v| v.id)?,
            resources: index("resource", dataset.resources, |r| r.id)?,
            events: index("event", dataset.events, |e| e.id)?,
            allocations: index("allocation", dataset.allocations, |a| a.id)?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(json)
            .map_err(|e| EngineError::Validation(format!("dataset is not valid JSON: {e}")))?;
        Self::from_dataset(dataset)
    }

    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            venues: self.venues.values().cloned().collect(),
            resources: self.resources.values().cloned().collect(),
            events: self.events.values().cloned().collect(),
            allocations: self.allocations.values().cloned().collect(),
        }
    }

    pub fn insert_venue(&mut self, venue: Venue) {
        self.venues.insert(venue.id, venue);
    }

    pub fn insert_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    /// Store a fully formed row, keeping its id. Used for seeding.
    pub fn put_event(&mut self, event: EventTemplate) {
        self.events.insert(event.id, event);
    }

    pub fn put_allocation(&mut self, allocation: ResourceAllocation) {
        self.allocations.insert(allocation.id, allocation);
    }
}

fn index<T>(
    entity: &str,
    rows: Vec<T>,
    key: impl Fn(&T) -> i64,
) -> Result<BTreeMap<i64, T>> {
    let mut map = BTreeMap::new();
    for row in rows {
        let id = key(&row);
        if map.insert(id, row).is_some() {
            return Err(EngineError::Validation(format!(
                "dataset contains {entity} {id} more than once"
            )));
        }
    }
    Ok(map)
}

fn next_id<T>(entity: &str, map: &BTreeMap<i64, T>) -> Result<i64> {
    match map.keys().next_back() {
        None => Ok(1),
        Some(last) => last
            .checked_add(1)
            .ok_or_else(|| EngineError::Internal(format!("{entity} id space exhausted"))),
    }
}

impl EventStore for MemoryStore {
    fn event(&self, id: EventId) -> Result<Option<EventTemplate>> {
        Ok(self.events.get(&id).cloned())
    }

    fn events(&self, filter: &EventFilter) -> Result<Vec<EventTemplate>> {
        Ok(self
            .events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    fn insert_event(&mut self, draft: NewEvent) -> Result<EventTemplate> {
        let id = next_id("event", &self.events)?;
        let event = draft.into_template(id);
        self.events.insert(id, event.clone());
        debug!(event_id = id, "stored event");
        Ok(event)
    }

    fn set_event_approval(&mut self, id: EventId, approved: bool) -> Result<EventTemplate> {
        let event = self
            .events
            .get_mut(&id)
            .ok_or(EngineError::NotFound { entity: "event", id })?;
        event.approved = approved;
        Ok(event.clone())
    }
}

impl VenueStore for MemoryStore {
    fn venue(&self, id: VenueId) -> Result<Option<Venue>> {
        Ok(self.venues.get(&id).cloned())
    }

    fn delete_venue(&mut self, id: VenueId) -> Result<()> {
        self.venues
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::NotFound { entity: "venue", id })
    }
}

impl ResourceStore for MemoryStore {
    fn resource(&self, id: ResourceId) -> Result<Option<Resource>> {
        Ok(self.resources.get(&id).cloned())
    }

    fn allocations_for(&self, resource_id: ResourceId) -> Result<Vec<ResourceAllocation>> {
        Ok(self
            .allocations
            .values()
            .filter(|a| a.resource_id == resource_id)
            .cloned()
            .collect())
    }

    fn allocation(&self, id: AllocationId) -> Result<Option<ResourceAllocation>> {
        Ok(self.allocations.get(&id).cloned())
    }

    fn insert_allocation(&mut self, request: NewAllocation) -> Result<ResourceAllocation> {
        let id = next_id("allocation", &self.allocations)?;
        let allocation = ResourceAllocation {
            id,
            event_id: request.event_id,
            resource_id: request.resource_id,
            quantity: request.quantity,
            status: AllocationStatus::Pending,
            notes: request.notes,
        };
        self.allocations.insert(id, allocation.clone());
        Ok(allocation)
    }

    fn set_allocation_status(
        &mut self,
        id: AllocationId,
        status: AllocationStatus,
    ) -> Result<ResourceAllocation> {
        let allocation = self.allocations.get_mut(&id).ok_or(EngineError::NotFound {
            entity: "allocation",
            id,
        })?;
        allocation.status = status;
        Ok(allocation.clone())
    }
}
