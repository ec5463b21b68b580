use crate::error::{GrenmlError, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::OnceLock;

const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Operational period of a Node or Link.
///
/// Both bounds are stored normalised as `YYYY-MM-DDTHH:MM:SS±HH:MM`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    pub start: Option<String>,
    pub end: Option<String>,
}

fn leading_date(raw: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(raw))
}

fn full_iso(raw: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:\d{2})?$").ok()
    })
    .as_ref()
    .is_some_and(|re| re.is_match(raw))
}

fn localize(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(DateTime::<FixedOffset>::from)
}

fn parse(raw: &str) -> Option<DateTime<FixedOffset>> {
    if !leading_date(raw) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return localize(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(localize)
}

/// Normalise a timestamp for storage.
///
/// Naive inputs take the local offset, bare dates become local midnight,
/// fractional seconds are dropped.
pub fn normalize_timestamp(field: &str, raw: &str) -> Result<String> {
    let raw = raw.trim();
    let parsed = parse(raw).ok_or_else(|| {
        GrenmlError::invalid(field, format!("'{}' is not an ISO 8601 date-time", raw))
    })?;
    Ok(format_datetime(&parsed))
}

pub fn format_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let truncated = dt.with_nanosecond(0).unwrap_or_else(|| dt.clone());
    truncated.format(STORED_FORMAT).to_string()
}

/// Complete date-time with an explicit time component.
pub fn is_full_iso(value: &str) -> bool {
    full_iso(value) && parse(value).is_some()
}

impl Lifetime {
    pub fn new(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let mut lifetime = Self::default();
        if let Some(start) = start {
            lifetime.set_start(start)?;
        }
        if let Some(end) = end {
            lifetime.set_end(end)?;
        }
        Ok(lifetime)
    }

    pub fn from_datetimes<Tz: TimeZone>(
        start: Option<&DateTime<Tz>>,
        end: Option<&DateTime<Tz>>,
    ) -> Self
    where
        Tz::Offset: Display,
    {
        Self {
            start: start.map(format_datetime),
            end: end.map(format_datetime),
        }
    }

    pub fn set_start(&mut self, raw: &str) -> Result<()> {
        self.start = Some(normalize_timestamp("lifetime_start", raw)?);
        Ok(())
    }

    pub fn set_end(&mut self, raw: &str) -> Result<()> {
        self.end = Some(normalize_timestamp("lifetime_end", raw)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
