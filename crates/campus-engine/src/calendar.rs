//! Time-window event assembly.
//!
//! [`list_events`] backs both the "all upcoming" view and the month calendar.
//! Stored one-off events that have not concluded are always listed. When a
//! month is given, recurring templates whose series reaches into that month
//! are expanded and materialized, and instances that have already concluded
//! are dropped. The combined list is ordered by date with a stable sort, so
//! same-day entries keep the order they were gathered in: stored events
//! first (in store order), then instances template by template.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::clock::{has_concluded, MonthBounds};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::expander::expand;
use crate::filter::{and, EventFilter};
use crate::occurrence::{materialize, EventOccurrence};
use crate::store::EventStore;

/// Which events a listing covers.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarQuery {
    /// Reference instant in campus-local wall-clock time.
    pub now: NaiveDateTime,
    /// Restrict to one calendar month and expand recurring series into it.
    pub month: Option<MonthBounds>,
    /// Extra predicates applied to stored rows (one-off events and
    /// templates alike), e.g. [`EventFilter::ApprovedOnly`].
    pub filter: EventFilter,
}

impl CalendarQuery {
    /// Every upcoming one-off event.
    pub fn upcoming(now: NaiveDateTime) -> Self {
        CalendarQuery {
            now,
            month: None,
            filter: EventFilter::All,
        }
    }

    /// The calendar for `month`, recurring instances included.
    pub fn month(now: NaiveDateTime, month: MonthBounds) -> Self {
        CalendarQuery {
            now,
            month: Some(month),
            filter: EventFilter::All,
        }
    }

    /// Parse an optional `"YYYY-MM"` filter. A malformed month is a
    /// validation error rather than a silently unfiltered listing.
    pub fn from_month_param(now: NaiveDateTime, month: Option<&str>) -> Result<Self> {
        match month {
            Some(raw) => Ok(Self::month(now, raw.parse()?)),
            None => Ok(Self::upcoming(now)),
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = and([self.filter, filter]);
        self
    }
}

/// Assemble the ordered occurrence list for `query`.
///
/// Never lists a one-off event twice, and lists at most one instance per
/// template per date. Storage failures propagate unchanged.
///
/// Each template contributes at most
/// [`EngineConfig::max_occurrences_per_series`] instances. A daily series
/// fills a month with up to 31, so a cap below 31 drops real instances
/// from the end of the month; truncation is logged at `warn`.
pub fn list_events<S: EventStore + ?Sized>(
    store: &S,
    query: &CalendarQuery,
    config: &EngineConfig,
) -> Result<Vec<EventOccurrence>> {
    let now = query.now;

    let one_off_filter = and([
        EventFilter::Recurring(false),
        EventFilter::NotConcluded { now },
        query.month.map_or(EventFilter::All, EventFilter::Month),
        query.filter.clone(),
    ]);
    let mut listing: Vec<EventOccurrence> = store
        .events(&one_off_filter)?
        .iter()
        .map(EventOccurrence::from_stored)
        .collect();
    let stored_count = listing.len();

    if let Some(month) = query.month {
        let window = month.window();
        let series_filter = and([
            EventFilter::Recurring(true),
            EventFilter::SeriesIntersects(window),
            query.filter.clone(),
        ]);

        for template in store.events(&series_filter)? {
            let mut produced = 0usize;
            for date in expand(&template, window)? {
                if produced == config.max_occurrences_per_series {
                    warn!(
                        template_id = template.id,
                        limit = config.max_occurrences_per_series,
                        %month,
                        "recurring series truncated"
                    );
                    break;
                }
                produced += 1;
                if has_concluded(date, template.end_time, now) {
                    continue;
                }
                listing.push(materialize(&template, date));
            }
        }
    }

    listing.sort_by_key(|occurrence| occurrence.date);

    debug!(
        stored = stored_count,
        instances = listing.len() - stored_count,
        month = ?query.month.map(|m| m.to_string()),
        "assembled event listing"
    );
    Ok(listing)
}
