use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Health state reported by the status API.
///
/// Anything outside the three known colors is kept as `Unknown` rather than
/// rejected, so a new upstream state never breaks the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    #[serde(other)]
    Unknown,
}

impl HealthStatus {
    /// Ordering used to pick the worst state of a day.
    pub fn severity(self) -> u8 {
        match self {
            HealthStatus::Green => 0,
            HealthStatus::Unknown => 1,
            HealthStatus::Yellow => 2,
            HealthStatus::Red => 3,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
            HealthStatus::Unknown => "unknown",
        }
    }

    pub fn background_class(self) -> String {
        format!("{}-bg", self.css_class())
    }

    pub fn is_operational(self) -> bool {
        self == HealthStatus::Green
    }
}

/// A single entry of the incident history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub status: HealthStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub datetime: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub datetime_end: Option<DateTime<Utc>>,
}

impl IncidentReport {
    /// Description text, treating an empty or blank string as absent.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Payload of the latest-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestStatus {
    pub status: HealthStatus,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub datetime: DateTime<Utc>,
}

/// Every endpoint wraps its payload in `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Everything one page load reads from upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub incidents: Vec<IncidentReport>,
    pub uptime: f64,
    pub latest: LatestStatus,
}

/// Parses RFC 3339, falling back to a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.replacen(' ', "T", 1)
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}
