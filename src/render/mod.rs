//! HTML rendering of a [`StatusPage`] with embedded Tera templates.
use chrono::FixedOffset;
use rust_embed::RustEmbed;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

pub mod copy;
pub mod humanize;

use crate::page::{ElementPatch, StatusPage};
use crate::timeline::DayBucket;
use crate::version::VERSION;
use copy::{day_anchor, day_label, incident_heading, incident_window};

const PAST_INCIDENTS_TEMPLATE: &str = "past_incidents.html";
const GRAPH_TEMPLATE: &str = "graph.html";
const DOCUMENT_TEMPLATE: &str = "index.html";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Templating error: {0}")]
    Template(#[from] tera::Error),
    #[error("Template not found: {0}")]
    MissingTemplate(String),
    #[error("Template {0} is not valid UTF-8")]
    InvalidEncoding(String),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Presentation knobs that do not come from upstream.
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    /// Used in incident headings, e.g. "Issues reported for the {service_name}".
    pub service_name: String,
    /// Offset used for day bucketing and all displayed times.
    pub offset: FixedOffset,
    pub timeline_days: u32,
}

/// The two regenerated lists of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFragments {
    pub past_incidents: String,
    pub graph: String,
}

#[derive(Serialize)]
struct DayView {
    label: String,
    anchor: String,
    color_class: String,
    incidents: Vec<IncidentView>,
}

#[derive(Serialize)]
struct IncidentView {
    status_class: &'static str,
    heading: String,
    description: Option<String>,
    window: String,
}

#[derive(Serialize)]
struct DaysContext<'a> {
    days: &'a [DayView],
}

#[derive(Serialize)]
struct DocumentContext<'a> {
    version: &'static str,
    generated_at: String,
    service_name: &'a str,
    current_class: String,
    status_class: &'static str,
    headline: &'static str,
    component_copy: &'static str,
    last_updated: &'a str,
    uptime: &'a str,
    graph: &'a str,
    past_incidents: &'a str,
}

/// Renders status pages. Cheap to share behind an `Arc`.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Loads the templates compiled into the binary.
    pub fn new() -> Result<Self, RenderError> {
        let mut sources = Vec::new();
        for name in [PAST_INCIDENTS_TEMPLATE, GRAPH_TEMPLATE, DOCUMENT_TEMPLATE] {
            let file =
                Templates::get(name).ok_or_else(|| RenderError::MissingTemplate(name.to_string()))?;
            let body = String::from_utf8(file.data.into_owned())
                .map_err(|_| RenderError::InvalidEncoding(name.to_string()))?;
            sources.push((name, body));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;
        Ok(Self { tera })
    }

    pub fn render_fragments(&self, page: &StatusPage) -> Result<PageFragments, RenderError> {
        let days: Vec<DayView> = page
            .timeline
            .iter()
            .map(|day| day_view(day, &page.settings))
            .collect();
        let context = Context::from_serialize(DaysContext { days: &days })?;

        Ok(PageFragments {
            past_incidents: self.tera.render(PAST_INCIDENTS_TEMPLATE, &context)?,
            graph: self.tera.render(GRAPH_TEMPLATE, &context)?,
        })
    }

    /// Full HTML document with every status element already filled in.
    pub fn render_document(&self, page: &StatusPage) -> Result<String, RenderError> {
        let fragments = self.render_fragments(page)?;
        let context = Context::from_serialize(DocumentContext {
            version: VERSION,
            generated_at: page.generated_at.to_rfc3339(),
            service_name: &page.settings.service_name,
            current_class: page.latest.status.background_class(),
            status_class: page.latest.status.css_class(),
            headline: page.copy.headline,
            component_copy: page.copy.component,
            last_updated: &page.last_updated,
            uptime: &page.uptime,
            graph: &fragments.graph,
            past_incidents: &fragments.past_incidents,
        })?;
        Ok(self.tera.render(DOCUMENT_TEMPLATE, &context)?)
    }

    /// The DOM writes a page load performs, in order.
    pub fn render_patches(&self, page: &StatusPage) -> Result<Vec<ElementPatch>, RenderError> {
        let fragments = self.render_fragments(page)?;
        Ok(page.patches(fragments))
    }

    pub fn render_patches_json(&self, page: &StatusPage) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(&self.render_patches(page)?)?)
    }
}

fn day_view(day: &DayBucket, settings: &DisplaySettings) -> DayView {
    DayView {
        label: day_label(day.date),
        anchor: day_anchor(day.date),
        color_class: day.color.background_class(),
        incidents: day
            .incidents()
            .map(|report| IncidentView {
                status_class: report.status.css_class(),
                heading: incident_heading(report.status, &settings.service_name),
                description: report.description().map(str::to_string),
                window: incident_window(report, settings.offset),
            })
            .collect(),
    }
}
