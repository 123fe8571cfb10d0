use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::status::{HealthStatus, IncidentReport};

/// Human copy shown for the latest status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCopy {
    /// Page-wide headline.
    pub headline: &'static str,
    /// Short label next to each component.
    pub component: &'static str,
}

impl StatusCopy {
    pub fn for_status(status: HealthStatus) -> Self {
        let (headline, component) = match status {
            HealthStatus::Red => ("System Outage", "Outage"),
            HealthStatus::Yellow => ("Degraded Performance", "Degraded Performance"),
            HealthStatus::Green => ("All Systems Operational", "Operational"),
            HealthStatus::Unknown => ("Unknown", "Unknown"),
        };
        Self {
            headline,
            component,
        }
    }
}

pub fn uptime_text(uptime: f64) -> String {
    format!("{uptime:.2} % Uptime")
}

pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn day_anchor(date: NaiveDate) -> String {
    format!("day-{}", date.format("%Y-%m-%d"))
}

pub fn incident_heading(status: HealthStatus, service_name: &str) -> String {
    match status {
        HealthStatus::Red => format!("Issues reported for the {service_name}"),
        _ => format!("Latency reported for the {service_name}"),
    }
}

/// "UTC" for a zero offset, otherwise e.g. "UTC+05:30".
pub fn zone_label(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "UTC".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("UTC{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Start and optional end of an incident, e.g. "Mar 9, 08:00 — 09:15 UTC".
pub fn incident_window(report: &IncidentReport, offset: FixedOffset) -> String {
    let start = format_local(report.datetime, offset, "%b %-d, %H:%M");
    match report.datetime_end {
        Some(end) => format!(
            "{start} — {} {}",
            format_local(end, offset, "%H:%M"),
            zone_label(offset)
        ),
        None => format!("{start} {}", zone_label(offset)),
    }
}

fn format_local(instant: DateTime<Utc>, offset: FixedOffset, pattern: &str) -> String {
    instant.with_timezone(&offset).format(pattern).to_string()
}
