//! The page-load routine: fetch, derive, and describe the resulting DOM writes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::render::copy::{StatusCopy, uptime_text};
use crate::render::humanize::time_ago;
use crate::render::{DisplaySettings, PageFragments, RenderError};
use crate::status::{FetchError, LatestStatus, StatusSnapshot, StatusSource, fetch_snapshot};
use crate::timeline::{DayBucket, build_timeline};

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Failed to fetch status data: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to render status page: {0}")]
    Render(#[from] RenderError),
}

/// A single mutation of one page element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl ElementPatch {
    fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            add_classes: Vec::new(),
            remove_classes: Vec::new(),
            text: None,
            html: None,
        }
    }

    pub fn add_class(selector: &str, class: impl Into<String>) -> Self {
        Self {
            add_classes: vec![class.into()],
            ..Self::new(selector)
        }
    }

    pub fn remove_class(selector: &str, class: impl Into<String>) -> Self {
        Self {
            remove_classes: vec![class.into()],
            ..Self::new(selector)
        }
    }

    pub fn text(selector: &str, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(selector)
        }
    }

    pub fn html(selector: &str, html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::new(selector)
        }
    }
}

/// Everything the page shows, derived from one snapshot.
#[derive(Debug, Clone)]
pub struct StatusPage {
    pub settings: DisplaySettings,
    pub latest: LatestStatus,
    pub copy: StatusCopy,
    /// "Last updated: ..." line.
    pub last_updated: String,
    pub uptime: String,
    pub timeline: Vec<DayBucket>,
    pub generated_at: DateTime<Utc>,
}

impl StatusPage {
    pub fn build(snapshot: StatusSnapshot, now: DateTime<Utc>, settings: DisplaySettings) -> Self {
        let today = now.with_timezone(&settings.offset).date_naive();
        let timeline = build_timeline(
            &snapshot.incidents,
            today,
            settings.offset,
            settings.timeline_days,
        );

        Self {
            copy: StatusCopy::for_status(snapshot.latest.status),
            last_updated: format!("Last updated: {}", time_ago(snapshot.latest.datetime, now)),
            uptime: uptime_text(snapshot.uptime),
            latest: snapshot.latest,
            timeline,
            generated_at: now,
            settings,
        }
    }

    pub fn days_with_incidents(&self) -> usize {
        self.timeline.iter().filter(|d| d.has_incidents()).count()
    }

    /// DOM writes in the order a page load applies them.
    pub fn patches(&self, fragments: PageFragments) -> Vec<ElementPatch> {
        let status = self.latest.status;
        vec![
            ElementPatch::add_class("#current", status.background_class()),
            ElementPatch::add_class("#cloud-api-status", status.css_class()),
            ElementPatch::add_class("#cloud-asset-status", status.css_class()),
            ElementPatch::text("#date", self.last_updated.clone()),
            ElementPatch::text("#current-status", self.copy.headline),
            ElementPatch::text("#cloud-api-status", self.copy.component),
            ElementPatch::text("#cloud-asset-status", self.copy.component),
            ElementPatch::remove_class("body", "loading"),
            ElementPatch::html("#past-incidents", fragments.past_incidents),
            ElementPatch::html("#graph", fragments.graph),
            ElementPatch::html("#uptime", self.uptime.clone()),
        ]
    }
}

/// Runs one page load against `source`. Nothing is cached between calls.
pub async fn refresh(
    source: &dyn StatusSource,
    settings: &DisplaySettings,
) -> Result<StatusPage, PageError> {
    refresh_with_clock(source, settings, Utc::now).await
}

/// Like [`refresh`], reading the time from `clock` once the fetches are done.
pub async fn refresh_with_clock<C>(
    source: &dyn StatusSource,
    settings: &DisplaySettings,
    clock: C,
) -> Result<StatusPage, PageError>
where
    C: Fn() -> DateTime<Utc>,
{
    let snapshot = fetch_snapshot(source).await?;
    let page = StatusPage::build(snapshot, clock(), settings.clone());
    info!(
        status = page.latest.status.css_class(),
        days = page.timeline.len(),
        days_with_incidents = page.days_with_incidents(),
        "Built status page."
    );
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PageRenderer;
    use crate::status::{HealthStatus, IncidentReport};
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Mutex;

    struct FixedSource {
        incidents: Vec<IncidentReport>,
        latest: LatestStatus,
        calls: Mutex<Vec<&'static str>>,
        fail_uptime: bool,
    }

    #[async_trait]
    impl StatusSource for FixedSource {
        async fn fetch_incidents(&self) -> Result<Vec<IncidentReport>, FetchError> {
            self.calls.lock().unwrap().push("incidents");
            Ok(self.incidents.clone())
        }

        async fn fetch_uptime(&self) -> Result<f64, FetchError> {
            self.calls.lock().unwrap().push("uptime");
            if self.fail_uptime {
                return Err(FetchError::InvalidUrl("uptime".to_string()));
            }
            Ok(98.5)
        }

        async fn fetch_latest(&self) -> Result<LatestStatus, FetchError> {
            self.calls.lock().unwrap().push("latest");
            Ok(self.latest.clone())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn source(fail_uptime: bool) -> FixedSource {
        FixedSource {
            incidents: vec![IncidentReport {
                status: HealthStatus::Red,
                description: Some("Database failover".to_string()),
                datetime: Utc.with_ymd_and_hms(2024, 3, 8, 3, 0, 0).unwrap(),
                datetime_end: None,
            }],
            latest: LatestStatus {
                status: HealthStatus::Red,
                datetime: now() - chrono::Duration::minutes(5),
            },
            calls: Mutex::new(Vec::new()),
            fail_uptime,
        }
    }

    fn settings() -> DisplaySettings {
        DisplaySettings {
            service_name: "Directus Cloud API".to_string(),
            offset: FixedOffset::east_opt(0).unwrap(),
            timeline_days: 30,
        }
    }

    #[tokio::test]
    async fn test_refresh_fetches_sequentially_and_builds_page() {
        let source = source(false);
        let page = refresh_with_clock(&source, &settings(), now).await.unwrap();

        assert_eq!(*source.calls.lock().unwrap(), vec!["incidents", "uptime", "latest"]);
        assert_eq!(page.copy.headline, "System Outage");
        assert_eq!(page.last_updated, "Last updated: 5 minutes ago");
        assert_eq!(page.uptime, "98.50 % Uptime");
        assert_eq!(page.timeline.len(), 30);
        assert_eq!(page.timeline[2].color, HealthStatus::Red);
        assert_eq!(page.days_with_incidents(), 1);
    }

    #[tokio::test]
    async fn test_refresh_stops_at_first_failure() {
        let source = source(true);
        let err = refresh_with_clock(&source, &settings(), now).await.unwrap_err();

        assert!(matches!(err, PageError::Fetch(FetchError::InvalidUrl(_))));
        assert_eq!(*source.calls.lock().unwrap(), vec!["incidents", "uptime"]);
    }

    /// Stamps `latest` with the wall clock at fetch time.
    struct LiveSource;

    #[async_trait]
    impl StatusSource for LiveSource {
        async fn fetch_incidents(&self) -> Result<Vec<IncidentReport>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_uptime(&self) -> Result<f64, FetchError> {
            Ok(100.0)
        }

        async fn fetch_latest(&self) -> Result<LatestStatus, FetchError> {
            tokio::task::yield_now().await;
            Ok(LatestStatus {
                status: HealthStatus::Green,
                datetime: Utc::now() - chrono::Duration::hours(2),
            })
        }
    }

    #[tokio::test]
    async fn test_refresh_reads_clock_after_fetching() {
        let page = refresh(&LiveSource, &settings()).await.unwrap();
        assert_eq!(page.last_updated, "Last updated: 2 hours ago");
        assert!(page.generated_at >= page.latest.datetime + chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn test_refresh_with_clock_samples_after_last_fetch() {
        let source = source(false);
        let clock = || {
            assert_eq!(source.calls.lock().unwrap().len(), 3);
            now()
        };
        let page = refresh_with_clock(&source, &settings(), clock).await.unwrap();
        assert_eq!(page.generated_at, now());
    }

    #[tokio::test]
    async fn test_patches_follow_page_load_order() {
        let page = refresh_with_clock(&source(false), &settings(), now).await.unwrap();
        let renderer = PageRenderer::new().unwrap();
        let patches = renderer.render_patches(&page).unwrap();

        let selectors: Vec<&str> = patches.iter().map(|p| p.selector.as_str()).collect();
        assert_eq!(
            selectors,
            vec![
                "#current",
                "#cloud-api-status",
                "#cloud-asset-status",
                "#date",
                "#current-status",
                "#cloud-api-status",
                "#cloud-asset-status",
                "body",
                "#past-incidents",
                "#graph",
                "#uptime",
            ]
        );
        assert_eq!(patches[0].add_classes, vec!["red-bg".to_string()]);
        assert_eq!(patches[1].add_classes, vec!["red".to_string()]);
        assert_eq!(patches[4].text.as_deref(), Some("System Outage"));
        assert_eq!(patches[6].text.as_deref(), Some("Outage"));
        assert_eq!(patches[7].remove_classes, vec!["loading".to_string()]);
        assert!(patches[8].html.as_deref().unwrap().contains("Database failover"));
        assert_eq!(patches[10].html.as_deref(), Some("98.50 % Uptime"));

        let json = renderer.render_patches_json(&page).unwrap();
        let decoded: Vec<ElementPatch> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, patches);
        assert!(json.contains("\"addClasses\""));
        assert!(!json.contains("\"removeClasses\": []"));
    }
}
