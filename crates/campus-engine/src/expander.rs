//! Recurrence rule evaluation.
//!
//! [`expand`] turns a stored template into the occurrence dates its rule
//! produces inside a closed date window. Rules are evaluated as RFC 5545
//! recurrences with the `rrule` crate: the anchor date is `DTSTART`, the
//! kind is `FREQ`, and the inclusive end date is `UNTIL`. Every call builds
//! its own rule set and iterator; there is no shared cursor.
//!
//! Series semantics per [`RecurrenceKind`]:
//!
//! - `DAILY` / `WEEKLY`: every 1 / 7 days from the anchor.
//! - `MONTHLY`: the anchor's day-of-month in every following month. Months
//!   that lack that day (the 31st in April, the 30th in February) are skipped,
//!   never clamped to the month's last day.
//!
//! Occurrences are generated at midnight UTC, so no offset can move one onto
//! a neighbouring calendar day.

use std::iter::FusedIterator;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use rrule::{Frequency, RRule, RRuleSet, RRuleSetIter, Tz, Unvalidated};

use crate::clock::DateWindow;
use crate::error::Result;
use crate::model::{EventTemplate, RecurrenceKind, RecurrenceRule};

impl RecurrenceKind {
    /// `FREQ` of the equivalent RFC 5545 rule.
    pub fn frequency(self) -> Frequency {
        match self {
            RecurrenceKind::Daily => Frequency::Daily,
            RecurrenceKind::Weekly => Frequency::Weekly,
            RecurrenceKind::Monthly => Frequency::Monthly,
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Tz> {
    Tz::UTC.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The `RRuleSet` of a series anchored at `anchor`.
///
/// Fails with a validation error when `rrule` rejects the rule, which
/// happens for an `until` date before the anchor.
pub fn rule_set(anchor: NaiveDate, rule: &RecurrenceRule) -> Result<RRuleSet> {
    let mut rrule: RRule<Unvalidated> = RRule::new(rule.kind.frequency());
    if let Some(until) = rule.until {
        rrule = rrule.until(midnight(until));
    }
    Ok(rrule.build(midnight(anchor))?)
}

// ── Occurrences ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Source {
    Series(RRuleSetIter),
    Single(Option<NaiveDate>),
}

/// Lazy sequence of occurrence dates, ascending and free of duplicates.
#[derive(Debug, Clone)]
pub struct Occurrences {
    source: Source,
    lower: NaiveDate,
    upper: NaiveDate,
    done: bool,
}

impl Occurrences {
    fn empty(anchor: NaiveDate) -> Self {
        Occurrences {
            source: Source::Single(None),
            lower: anchor,
            upper: anchor,
            done: true,
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.done {
            return None;
        }
        let next = match &mut self.source {
            Source::Single(date) => date
                .take()
                .filter(|date| (self.lower..=self.upper).contains(date)),
            Source::Series(dates) => loop {
                let Some(occurrence) = dates.next() else {
                    break None;
                };
                let date = occurrence.date_naive();
                if date >= self.lower {
                    break (date <= self.upper).then_some(date);
                }
            },
        };
        if next.is_none() {
            self.done = true;
        }
        next
    }
}

impl FusedIterator for Occurrences {}

// ── expand ──────────────────────────────────────────────────────────────────

/// Occurrence dates of `template` that fall inside `window`.
///
/// For a recurring template this is every date its rule produces from the
/// anchor date, within `window` and not after the rule's `until` date. A
/// one-off template yields its own date when that date lies inside the
/// window.
///
/// The sequence is empty when the anchor is after the window, or when the
/// series ends before the window starts. Generation walks forward from the
/// anchor, so skipping to a late window costs one step per earlier
/// occurrence.
///
/// # Examples
///
/// ```
/// use campus_engine::clock::DateWindow;
/// use campus_engine::expander::expand_rule;
/// use campus_engine::model::RecurrenceRule;
/// use chrono::NaiveDate;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
/// let rule = RecurrenceRule::weekly().until(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
/// let window = DateWindow::new(d(7, 1), d(7, 31)).unwrap();
///
/// let dates: Vec<_> = expand_rule(d(6, 25), Some(rule), window).unwrap().collect();
/// assert_eq!(dates, vec![d(7, 2), d(7, 9), d(7, 16), d(7, 23), d(7, 30)]);
/// ```
pub fn expand(template: &EventTemplate, window: DateWindow) -> Result<Occurrences> {
    expand_rule(template.date, template.recurrence, window)
}

/// [`expand`] over a bare anchor date and optional rule.
pub fn expand_rule(
    anchor: NaiveDate,
    rule: Option<RecurrenceRule>,
    window: DateWindow,
) -> Result<Occurrences> {
    let Some(rule) = rule else {
        return Ok(Occurrences {
            source: Source::Single(Some(anchor)),
            lower: window.start,
            upper: window.end,
            done: false,
        });
    };

    let lower = window.start.max(anchor);
    let upper = match rule.until {
        Some(until) => window.end.min(until),
        None => window.end,
    };
    if lower > upper {
        return Ok(Occurrences::empty(anchor));
    }

    let set = rule_set(anchor, &rule)?;
    Ok(Occurrences {
        source: Source::Series((&set).into_iter()),
        lower,
        upper,
        done: false,
    })
}

/// Whether a series anchored at `anchor` could produce anything inside
/// `window`, judged from its bounds alone.
pub fn series_intersects(anchor: NaiveDate, rule: &RecurrenceRule, window: DateWindow) -> bool {
    anchor <= window.end && rule.until.is_none_or(|until| until >= window.start)
}

// ── Tests ───────────────────────────────────────────────────────────────────
