// ABOUTME: Business-hours window used to decide when a fleet may idle to zero.
// ABOUTME: Parses "8-19", "08:00-19:00" or {start, end}; weekends are always off-hours.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Working hours on weekdays. Both bounds are whole hours and inclusive, so
/// `8-19` covers 08:00 through 19:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub start: u32,
    pub end: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self { start: 8, end: 19 }
    }
}

impl BusinessHours {
    pub fn new(start: u32, end: u32) -> Result<Self, String> {
        if start > 23 || end > 23 {
            return Err(format!("business hours must be within 0-23, got {start}-{end}"));
        }
        if start > end {
            return Err(format!("business hours start after they end: {start}-{end}"));
        }
        Ok(Self { start, end })
    }

    /// Weekend, or a weekday hour outside the window.
    pub fn is_off_hours(&self, now: NaiveDateTime) -> bool {
        let weekend = matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
        let hour = now.hour();
        weekend || hour < self.start || hour > self.end
    }
}

fn parse_hour(s: &str) -> Result<u32, String> {
    let hour = s.split(':').next().unwrap_or(s).trim();
    hour.parse::<u32>()
        .map_err(|_| format!("invalid hour: {s}"))
}

impl FromStr for BusinessHours {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid business hours (expected START-END): {s}"))?;
        BusinessHours::new(parse_hour(start)?, parse_hour(end)?)
    }
}

impl fmt::Display for BusinessHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HoursEntry {
    Range(String),
    Detailed { start: u32, end: u32 },
}

impl<'de> Deserialize<'de> for BusinessHours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match HoursEntry::deserialize(deserializer)? {
            HoursEntry::Range(s) => s.parse().map_err(de::Error::custom),
            HoursEntry::Detailed { start, end } => {
                BusinessHours::new(start, end).map_err(de::Error::custom)
            }
        }
    }
}

impl Serialize for BusinessHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
