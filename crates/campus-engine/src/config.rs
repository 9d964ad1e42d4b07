//! Engine configuration.

use std::env;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

use crate::error::{EngineError, Result};

pub const ENV_TIMEZONE: &str = "CAMPUS_TIMEZONE";
pub const ENV_DESCRIPTION_WORD_LIMIT: &str = "CAMPUS_DESCRIPTION_WORD_LIMIT";
pub const ENV_MAX_OCCURRENCES: &str = "CAMPUS_MAX_OCCURRENCES";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Zone in which stored dates and times of day are interpreted. "Now"
    /// is converted into this zone before any concluded-event comparison.
    #[serde(deserialize_with = "deserialize_tz")]
    pub timezone: Tz,
    /// Longest event description accepted at creation, in words.
    pub description_word_limit: usize,
    /// Most occurrences a single recurring template may contribute to one
    /// listing window. Values below 31 truncate daily series in a month
    /// listing.
    pub max_occurrences_per_series: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            description_word_limit: 500,
            max_occurrences_per_series: 366,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `CAMPUS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(tz) = lookup(ENV_TIMEZONE) {
            config.timezone = parse_timezone(&tz)?;
        }
        if let Some(limit) = lookup(ENV_DESCRIPTION_WORD_LIMIT) {
            config.description_word_limit = parse_count(ENV_DESCRIPTION_WORD_LIMIT, &limit)?;
        }
        if let Some(max) = lookup(ENV_MAX_OCCURRENCES) {
            config.max_occurrences_per_series = parse_count(ENV_MAX_OCCURRENCES, &max)?;
        }
        Ok(config)
    }

    /// Wall-clock time in the campus zone at the instant `now`.
    pub fn now_local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.timezone).naive_local()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.now_local(now).date()
    }
}

fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::Validation(format!("invalid timezone '{s}'")))
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(EngineError::Validation(format!(
            "{key} must be a positive integer, got '{value}'"
        ))),
    }
}

fn deserialize_tz<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Tz, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_timezone(&s).map_err(serde::de::Error::custom)
}
