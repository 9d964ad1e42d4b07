//! Calendar primitives shared by every component.
//!
//! All temporal reasoning in this crate is done on naive calendar dates and
//! wall-clock times of day. The caller supplies "now" explicitly (already
//! converted into the campus time zone, see [`crate::config::EngineConfig::now_local`]),
//! so nothing here reads the system clock.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};

// ── TimeOfDay ───────────────────────────────────────────────────────────────

/// A zero-padded 24-hour time of day, written `HH:MM` or `HH:MM:SS`.
///
/// Ordering is chronological, which for zero-padded 24-hour strings is the
/// same as lexicographic ordering of the textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(TimeOfDay)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let format = match s.len() {
            5 => "%H:%M",
            8 => "%H:%M:%S",
            _ => {
                return Err(EngineError::Validation(format!(
                    "time '{s}' must be HH:MM or HH:MM:SS"
                )))
            }
        };
        NaiveTime::parse_from_str(s, format)
            .map(TimeOfDay)
            .map_err(|e| EngineError::Validation(format!("time '{s}': {e}")))
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        TimeOfDay(t)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.second() == 0 {
            write!(f, "{}", self.0.format("%H:%M"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        }
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── DateWindow ──────────────────────────────────────────────────────────────

/// A closed interval of calendar dates, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EngineError::Validation(format!(
                "window start {start} is after window end {end}"
            )));
        }
        Ok(DateWindow { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ── MonthBounds ─────────────────────────────────────────────────────────────

/// A calendar month parsed from a `"YYYY-MM"` filter string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBounds {
    pub year: i32,
    pub month: u32,
    window: DateWindow,
}

impl MonthBounds {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            EngineError::Validation(format!("month {year:04}-{month:02} does not exist"))
        })?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| {
                EngineError::Validation(format!("month {year:04}-{month:02} is out of range"))
            })?;
        Ok(MonthBounds {
            year,
            month,
            window: DateWindow {
                start: first,
                end: last,
            },
        })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first);
        MonthBounds {
            year: date.year(),
            month: date.month(),
            window: DateWindow {
                start: first,
                end: last,
            },
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.window.start
    }

    pub fn last_day(&self) -> NaiveDate {
        self.window.end
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }
}

impl FromStr for MonthBounds {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::Validation(format!("month filter '{s}' must be YYYY-MM"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthBounds::new(year, month)
    }
}

impl fmt::Display for MonthBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ── has_concluded ───────────────────────────────────────────────────────────

/// Whether an event on `date` ending at `end_time` is over as of `now`.
///
/// An event is still upcoming when its date is in the future, or when it is
/// today and its end time is still ahead of the current time. This is the
/// only definition of "past" used anywhere in the crate.
pub fn has_concluded(date: NaiveDate, end_time: TimeOfDay, now: NaiveDateTime) -> bool {
    let today = now.date();
    if date > today {
        return false;
    }
    if date == today {
        return end_time.as_naive() <= now.time();
    }
    true
}

// ── Tests ───────────────────────────────────────────────────────────────────
