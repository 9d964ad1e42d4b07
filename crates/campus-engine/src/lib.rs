//! # campus-engine
//!
//! Scheduling core for a university event system.
//!
//! The engine expands recurring event templates into concrete calendar
//! occurrences, assembles month and upcoming-event listings, decides whether
//! a venue can be booked without double-booking an approved event, and keeps
//! the ledger of finite shared resources (projectors, staff, furniture) so
//! they are never oversubscribed. Rows come from a host-provided store; every
//! function is synchronous and takes "now" as an explicit argument.
//!
//! ## Modules
//!
//! - [`clock`]: Times of day, month bounds, and the `has_concluded` rule
//! - [`model`]: Stored rows: events, venues, resources, allocations
//! - [`expander`]: Recurrence rule (RRULE) to a lazy sequence of occurrence dates
//! - [`occurrence`]: Materialize a template onto a date with a synthetic id
//! - [`filter`]: Composable typed predicates over stored events
//! - [`calendar`]: Merge one-off events and recurring instances for a window
//! - [`conflict`]: Venue double-booking detection
//! - [`scheduling`]: Event creation pipeline, approval, venue removal
//! - [`ledger`]: Resource availability and allocation lifecycle
//! - [`store`]: Persistence collaborator traits
//! - [`memory`]: In-memory store and JSON dataset
//! - [`config`]: Engine configuration
//! - [`error`]: Error types

pub mod calendar;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod filter;
pub mod ledger;
pub mod memory;
pub mod model;
pub mod occurrence;
pub mod scheduling;
pub mod store;

pub use calendar::{list_events, CalendarQuery};
pub use clock::{has_concluded, DateWindow, MonthBounds, TimeOfDay};
pub use config::EngineConfig;
pub use conflict::{check_venue, find_conflict, has_conflict, BookingSlot, ConflictCheck};
pub use error::{EngineError, ErrorKind};
pub use expander::{expand, expand_rule, rule_set, Occurrences};
pub use filter::EventFilter;
pub use ledger::{allocate, availability, can_allocate, set_status, AllocationCheck, Availability};
pub use memory::{Dataset, MemoryStore};
pub use model::{
    AllocationStatus, EventTemplate, NewAllocation, NewEvent, Organizer, OrganizerRole,
    PriorityTier, RecurrenceKind, RecurrenceRule, Resource, ResourceAllocation, ResourceCategory,
    Venue,
};
pub use occurrence::{materialize, EventOccurrence, OccurrenceId};
pub use scheduling::{approve_event, create_event, delete_venue, validate_new_event};
pub use store::{EventStore, ResourceStore, VenueStore};
