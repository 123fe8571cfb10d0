//! Upstream status API: wire models and the fetching side of a page load.
pub mod client;
pub mod models;

pub use client::{FetchError, HttpStatusSource, StatusSource, fetch_snapshot};
pub use models::{HealthStatus, IncidentReport, LatestStatus, StatusSnapshot};
