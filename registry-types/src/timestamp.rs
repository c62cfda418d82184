//! ISO-8601 timestamps.
//!
//! Values without an explicit offset are localised to a configured default
//! offset. Rendering always carries microseconds and the offset, so stored
//! `dateModified` strings sort lexicographically in time order as long as they
//! share an offset.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time with a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Current time expressed in `offset`.
    #[must_use]
    pub fn now(offset: FixedOffset) -> Self {
        Self(Utc::now().with_timezone(&offset))
    }

    /// Wraps an existing chrono value.
    #[must_use]
    pub const fn from_datetime(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }

    /// Returns the underlying chrono value.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Parses an ISO-8601 string.
    ///
    /// Accepts full RFC 3339 values, naive date-times (`T` or space separated)
    /// and bare dates. Naive values are interpreted in `default_offset`.
    pub fn parse(value: &str, default_offset: FixedOffset) -> Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self(dt));
        }
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
            .or_else(|_| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(Default::default()))
            })
            .map_err(|_| Error::InvalidTimestamp(value.to_string()))?;
        default_offset
            .from_local_datetime(&naive)
            .single()
            .map(Self)
            .ok_or_else(|| Error::InvalidTimestamp(value.to_string()))
    }

    /// Renders as `YYYY-MM-DDTHH:MM:SS.ffffff+HH:MM`.
    #[must_use]
    pub fn to_iso(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

/// Parses a `+HH:MM` / `-HH:MM` offset string (or `Z`).
pub fn parse_offset(value: &str) -> Result<FixedOffset> {
    if value == "Z" || value == "UTC" {
        return Ok(Utc.fix());
    }
    value
        .parse::<FixedOffset>()
        .map_err(|_| Error::InvalidOffset(value.to_string()))
}
