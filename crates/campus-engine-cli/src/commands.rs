//! Subcommand implementations. Each one loads the dataset, calls into the
//! engine, prints a JSON result on stdout, and saves the dataset when asked.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use campus_engine::{
    calendar, conflict, ledger, scheduling, AllocationStatus, BookingSlot, CalendarQuery,
    DateWindow, EngineConfig, EngineError, EventFilter, EventStore, MemoryStore, NewAllocation,
    NewEvent, TimeOfDay,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

pub struct Context {
    path: PathBuf,
    config: EngineConfig,
    store: MemoryStore,
    now: NaiveDateTime,
}

impl Context {
    pub fn load(path: &Path, now: DateTime<Utc>) -> Result<Self> {
        let config = EngineConfig::from_env().context("invalid CAMPUS_* configuration")?;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let store = MemoryStore::from_json(&raw)
            .with_context(|| format!("failed to load dataset {}", path.display()))?;
        let now = config.now_local(now);
        Ok(Context {
            path: path.to_path_buf(),
            config,
            store,
            now,
        })
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.store.to_dataset())?;
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("failed to write dataset {}", self.path.display()))?;
        info!(path = %self.path.display(), "dataset saved");
        Ok(())
    }

    fn finish(&self, write: bool) -> Result<()> {
        if write {
            self.save()?;
        }
        Ok(())
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn calendar(
    ctx: &Context,
    month: Option<&str>,
    approved_only: bool,
    venue: Option<i64>,
) -> Result<()> {
    let mut query = CalendarQuery::from_month_param(ctx.now, month)?;
    if approved_only {
        query = query.with_filter(EventFilter::ApprovedOnly);
    }
    if let Some(venue_id) = venue {
        query = query.with_filter(EventFilter::Venue(venue_id));
    }
    let listing = calendar::list_events(&ctx.store, &query, &ctx.config)?;
    print(&listing)
}

pub fn expand(ctx: &Context, event_id: i64, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let template = ctx.store.require_event(event_id)?;
    let window = DateWindow::new(from, to)?;
    let limit = ctx.config.max_occurrences_per_series;
    let mut dates: Vec<_> = campus_engine::expand(&template, window)?
        .take(limit.saturating_add(1))
        .collect();
    let truncated = dates.len() > limit;
    if truncated {
        dates.truncate(limit);
        warn!(event_id, limit, %from, %to, "expansion truncated");
    }
    print(&json!({ "event_id": event_id, "dates": dates, "truncated": truncated }))
}

pub fn check_conflict(
    ctx: &Context,
    venue_id: i64,
    date: NaiveDate,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
) -> Result<()> {
    let slot = BookingSlot {
        venue_id,
        date,
        start_time,
        end_time,
    };
    let check = conflict::check_venue(&ctx.store, &slot, None)?;
    print(&check)
}

pub fn create_event(mut ctx: Context, draft: &Path, write: bool) -> Result<()> {
    let raw = fs::read_to_string(draft)
        .with_context(|| format!("failed to read draft {}", draft.display()))?;
    let draft: NewEvent = serde_json::from_str(&raw)
        .map_err(|e| EngineError::Validation(e.to_string()))
        .with_context(|| format!("draft {} is not a valid event", draft.display()))?;
    let event = scheduling::create_event(&mut ctx.store, draft, &ctx.config)?;
    print(&event)?;
    ctx.finish(write)
}

pub fn approve_event(mut ctx: Context, event_id: i64, write: bool) -> Result<()> {
    let event = scheduling::approve_event(&mut ctx.store, event_id)?;
    print(&event)?;
    ctx.finish(write)
}

pub fn availability(ctx: &Context, resource_id: i64, quantity: Option<u32>) -> Result<()> {
    match quantity {
        Some(quantity) => print(&ledger::can_allocate(&ctx.store, resource_id, quantity)?),
        None => print(&ledger::availability(&ctx.store, resource_id)?),
    }
}

pub fn allocate(
    mut ctx: Context,
    event_id: i64,
    resource_id: i64,
    quantity: u32,
    notes: Option<String>,
    write: bool,
) -> Result<()> {
    let allocation = ledger::allocate(
        &mut ctx.store,
        NewAllocation {
            event_id,
            resource_id,
            quantity,
            notes,
        },
    )?;
    print(&allocation)?;
    ctx.finish(write)
}

pub fn set_status(
    mut ctx: Context,
    allocation_id: i64,
    status: AllocationStatus,
    write: bool,
) -> Result<()> {
    let allocation = ledger::set_status(&mut ctx.store, allocation_id, status)?;
    print(&allocation)?;
    ctx.finish(write)
}
