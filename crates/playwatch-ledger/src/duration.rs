//! Play-time arithmetic.
//!
//! Durations are kept as whole milliseconds. The `"{h}h {m}m {s}s"` text
//! form only exists at the serialization boundary, where it doubles as
//! the snapshot storage format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// An amount of play time, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayTime(u64);

impl PlayTime {
    pub const ZERO: PlayTime = PlayTime(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed from `start` to `end`. Clock skew that puts `end`
    /// before `start` yields zero, never a negative duration.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let ms = (end - start).num_milliseconds();
        Self(u64::try_from(ms).unwrap_or(0))
    }

    pub fn saturating_add(self, other: PlayTime) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parses the `"{h}h {m}m {s}s"` form. Anything else is zero.
    pub fn parse(text: &str) -> Self {
        Self(parse_duration(text))
    }
}

impl fmt::Display for PlayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

/// Renders milliseconds as `"{h}h {m}m {s}s"`, flooring each unit.
///
/// ```
/// assert_eq!(playwatch_ledger::format_duration(90_500), "0h 1m 30s");
/// ```
pub fn format_duration(ms: u64) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    format!("{hours}h {minutes}m {seconds}s")
}

/// Inverse of [`format_duration`]. Returns 0 for any input that is not
/// exactly `<digits>h <digits>m <digits>s`, including values too large
/// to represent.
pub fn parse_duration(text: &str) -> u64 {
    parse_parts(text).unwrap_or(0)
}

fn parse_parts(text: &str) -> Option<u64> {
    let (hours, rest) = text.split_once("h ")?;
    let (minutes, rest) = rest.split_once("m ")?;
    let seconds = rest.strip_suffix('s')?;

    let hours = digits(hours)?;
    let minutes = digits(minutes)?;
    let seconds = digits(seconds)?;

    hours
        .checked_mul(MS_PER_HOUR)?
        .checked_add(minutes.checked_mul(MS_PER_MINUTE)?)?
        .checked_add(seconds.checked_mul(MS_PER_SECOND)?)
}

/// `str::parse` accepts a leading `+`; the stored format never has one.
fn digits(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl Serialize for PlayTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlayTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlayTimeVisitor;

        impl Visitor<'_> for PlayTimeVisitor {
            type Value = PlayTime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration string like \"1h 2m 3s\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PlayTime, E> {
                Ok(PlayTime::parse(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<PlayTime, E> {
                Ok(PlayTime::ZERO)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<PlayTime, E> {
                Ok(PlayTime::ZERO)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<PlayTime, E> {
                Ok(PlayTime::ZERO)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<PlayTime, E> {
                Ok(PlayTime::ZERO)
            }

            fn visit_none<E: de::Error>(self) -> Result<PlayTime, E> {
                Ok(PlayTime::ZERO)
            }
        }

        deserializer.deserialize_any(PlayTimeVisitor)
    }
}
