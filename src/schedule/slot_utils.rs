use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A local wall-clock time of day, stored as minutes since midnight.
///
/// Displays and serializes as a 12-hour label such as `9:15am` or `12:00pm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Builds a time from minutes since midnight, wrapping past midnight
    pub fn from_minutes(minutes: u16) -> Self {
        ClockTime(minutes % MINUTES_PER_DAY)
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if hours >= 24 || minutes >= 60 {
            return None;
        }
        Some(ClockTime(hours * 60 + minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Shifts the time by a signed number of minutes, wrapping around midnight
    pub fn offset(self, delta: i32) -> Self {
        let shifted = (self.0 as i32 + delta).rem_euclid(MINUTES_PER_DAY as i32);
        ClockTime(shifted as u16)
    }

    /// Minutes from `earlier` to `self` on the same day (negative if `self` is earlier)
    pub fn minutes_since(self, earlier: ClockTime) -> i32 {
        self.0 as i32 - earlier.0 as i32
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&minutes_to_time_string(self.0))
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_to_minutes(s)
            .map(ClockTime)
            .ok_or_else(|| format!("unrecognised time of day '{}'", s))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a time label to minutes since midnight.
///
/// Accepts 12-hour labels (`9:15am`, `9:15 PM`, `9am`, `12:00pm`) and 24-hour
/// labels (`09:15`, `21:30`, `21:30:00`). With a meridiem, `12am` is 0 and
/// `12pm` is 720; other PM hours add 720.
pub fn parse_time_to_minutes(time_str: &str) -> Option<u16> {
    let clean = time_str.trim().to_lowercase().replace('.', "");

    let (body, is_pm) = if let Some(body) = clean.strip_suffix("am") {
        (body.trim_end(), Some(false))
    } else if let Some(body) = clean.strip_suffix("pm") {
        (body.trim_end(), Some(true))
    } else {
        (clean.as_str(), None)
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let hours: u16 = parts[0].trim().parse().ok()?;
    let minutes: u16 = match parts.get(1) {
        Some(m) => m.trim().parse().ok()?,
        // A bare hour is only meaningful with am/pm
        None if is_pm.is_some() => 0,
        None => return None,
    };
    if let Some(seconds) = parts.get(2) {
        let _: u16 = seconds.trim().parse().ok()?;
    }
    if minutes >= 60 {
        return None;
    }

    match is_pm {
        Some(pm) => {
            if hours == 0 || hours > 12 {
                return None;
            }
            let base = (hours % 12) * 60 + minutes;
            Some(if pm { base + 720 } else { base })
        }
        None => {
            if hours >= 24 {
                return None;
            }
            Some(hours * 60 + minutes)
        }
    }
}

/// Formats minutes since midnight as a 12-hour label (`9:15am`)
pub fn minutes_to_time_string(minutes: u16) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hours = minutes / 60;
    let mins = minutes % 60;
    let suffix = if hours < 12 { "am" } else { "pm" };
    let display_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02}{}", display_hour, mins, suffix)
}
