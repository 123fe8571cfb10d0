//! Day-by-day health timeline derived from the incident history.
use chrono::{Days, FixedOffset, NaiveDate};

use crate::status::{HealthStatus, IncidentReport};

pub const DEFAULT_TIMELINE_DAYS: u32 = 30;

/// One calendar day of the timeline, in the display offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// Every report that started on this day, in upstream order.
    pub reports: Vec<IncidentReport>,
    pub color: HealthStatus,
}

impl DayBucket {
    /// Reports worth listing in the incident log.
    pub fn incidents(&self) -> impl Iterator<Item = &IncidentReport> {
        self.reports.iter().filter(|r| !r.status.is_operational())
    }

    pub fn has_incidents(&self) -> bool {
        self.incidents().next().is_some()
    }
}

/// Buckets `reports` into `days` calendar days ending at `today`, newest first.
///
/// Reports are assigned by the date of their start time once shifted into
/// `offset`. Reports outside the window are dropped.
pub fn build_timeline(
    reports: &[IncidentReport],
    today: NaiveDate,
    offset: FixedOffset,
    days: u32,
) -> Vec<DayBucket> {
    (0..days)
        .filter_map(|i| today.checked_sub_days(Days::new(u64::from(i))))
        .map(|date| {
            let reports: Vec<IncidentReport> = reports
                .iter()
                .filter(|r| r.datetime.with_timezone(&offset).date_naive() == date)
                .cloned()
                .collect();
            let color = worst_status(&reports);
            DayBucket {
                date,
                reports,
                color,
            }
        })
        .collect()
}

/// Worst state among `reports`, green when there are none.
pub fn worst_status(reports: &[IncidentReport]) -> HealthStatus {
    let mut color = HealthStatus::Green;
    for report in reports {
        if report.status.severity() > color.severity() {
            color = report.status;
        }
        if color == HealthStatus::Red {
            break;
        }
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report(status: HealthStatus, y: i32, m: u32, d: u32, h: u32) -> IncidentReport {
        IncidentReport {
            status,
            description: None,
            datetime: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            datetime_end: None,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_window_is_newest_first_and_sized() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let timeline = build_timeline(&[], today, utc(), 30);
        assert_eq!(timeline.len(), 30);
        assert_eq!(timeline[0].date, today);
        assert_eq!(timeline[29].date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert!(timeline.iter().all(|d| d.color == HealthStatus::Green));
        assert!(timeline.iter().all(|d| !d.has_incidents()));
    }

    #[test]
    fn test_reports_land_on_their_day_in_order() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let reports = vec![
            report(HealthStatus::Yellow, 2024, 3, 9, 8),
            report(HealthStatus::Green, 2024, 3, 10, 1),
            report(HealthStatus::Red, 2024, 3, 9, 2),
            report(HealthStatus::Red, 2024, 1, 1, 2),
        ];
        let timeline = build_timeline(&reports, today, utc(), 30);

        assert_eq!(timeline[0].reports.len(), 1);
        assert_eq!(timeline[0].color, HealthStatus::Green);
        assert!(!timeline[0].has_incidents());

        let yesterday = &timeline[1];
        assert_eq!(yesterday.reports, vec![reports[0].clone(), reports[2].clone()]);
        assert_eq!(yesterday.color, HealthStatus::Red);
        assert_eq!(yesterday.incidents().count(), 2);

        let total: usize = timeline.iter().map(|d| d.reports.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_offset_moves_report_across_midnight() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let late = vec![report(HealthStatus::Yellow, 2024, 3, 9, 23)];

        let in_utc = build_timeline(&late, today, utc(), 2);
        assert_eq!(in_utc[1].color, HealthStatus::Yellow);

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let shifted = build_timeline(&late, today, plus_two, 2);
        assert_eq!(shifted[0].color, HealthStatus::Yellow);
        assert_eq!(shifted[1].color, HealthStatus::Green);
    }

    #[test]
    fn test_worst_status() {
        assert_eq!(worst_status(&[]), HealthStatus::Green);

        let degraded = vec![
            report(HealthStatus::Green, 2024, 3, 9, 1),
            report(HealthStatus::Unknown, 2024, 3, 9, 2),
            report(HealthStatus::Yellow, 2024, 3, 9, 3),
            report(HealthStatus::Unknown, 2024, 3, 9, 4),
        ];
        assert_eq!(worst_status(&degraded), HealthStatus::Yellow);

        let outage = vec![
            report(HealthStatus::Red, 2024, 3, 9, 1),
            report(HealthStatus::Yellow, 2024, 3, 9, 2),
        ];
        assert_eq!(worst_status(&outage), HealthStatus::Red);
    }
}
