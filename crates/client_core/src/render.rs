//! Pure transforms from fetched payloads to view fragments.
//!
//! Every function here is a straight payload-to-markup mapping with no
//! access to controller state; rendering the same input twice yields the
//! same bytes.

use askama::Template;
use chrono::{DateTime, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use thiserror::Error;

use shared::domain::PerformanceBand;
use shared::protocol::{DashboardSummary, KpiRecord};

use crate::view::{ViewAnchor, ViewState};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

pub const TARGET_PLACEHOLDER: &str = "N/A";

const EMPTY_RECENT_TABLE: &str =
    r#"<tr class="empty-state"><td colspan="6">No recent KPI data.</td></tr>"#;
const EMPTY_KPI_LIST: &str =
    r#"<div class="empty-state">No KPIs found for the selected department.</div>"#;
const LOADING_BANNER: &str = r#"<div class="loading-indicator">Loading dashboard data...</div>"#;

pub fn format_count(count: u64) -> String {
    count.to_formatted_string(&Locale::en)
}

pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// `N/A` only when the target is absent; a target of 0 renders as "0".
pub fn format_target(target: Option<f64>) -> String {
    match target {
        Some(target) => target.to_string(),
        None => TARGET_PLACEHOLDER.to_string(),
    }
}

/// Date plus minute-precision time. The service historically emitted
/// naive UTC timestamps without an offset, so both spellings parse;
/// anything else renders verbatim rather than failing the row.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return stamped.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

/// The three counter slots, thousands-grouped.
pub fn summary_counters(summary: &DashboardSummary) -> [(ViewAnchor, String); 3] {
    [
        (
            ViewAnchor::TotalDepartments,
            format_count(summary.total_departments),
        ),
        (ViewAnchor::TotalKpis, format_count(summary.total_kpis)),
        (
            ViewAnchor::TotalDataPoints,
            format_count(summary.total_data_points),
        ),
    ]
}

struct RecordView {
    name: String,
    department: String,
    value: String,
    target: String,
    badge_class: &'static str,
    badge_label: String,
    timestamp: String,
}

impl RecordView {
    fn from_record(record: &KpiRecord) -> Self {
        Self {
            name: record.kpi_name.clone(),
            department: record.department.clone(),
            value: format_value(record.value),
            target: format_target(record.target),
            badge_class: PerformanceBand::from_label(&record.performance).css_class(),
            badge_label: record.performance.clone(),
            timestamp: format_timestamp(&record.timestamp),
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"{% for row in rows %}<tr>
  <td>{{ row.name }}</td>
  <td>{{ row.department }}</td>
  <td>{{ row.value }}</td>
  <td>{{ row.target }}</td>
  <td><span class="performance-badge {{ row.badge_class }}">{{ row.badge_label }}</span></td>
  <td>{{ row.timestamp }}</td>
</tr>
{% endfor %}"#,
    ext = "html"
)]
struct RecentRowsTemplate {
    rows: Vec<RecordView>,
}

#[derive(Template)]
#[template(
    source = r#"{% for card in cards %}<div class="card kpi-card">
  <div class="card-header">
    <h3 class="card-title">{{ card.name }}</h3>
    <span class="kpi-department">{{ card.department }}</span>
  </div>
  <div class="card-body">
    <div class="kpi-value">{{ card.value }}</div>
    <div class="kpi-target">Target: {{ card.target }}</div>
    <span class="performance-badge {{ card.badge_class }}">{{ card.badge_label }}</span>
    <div class="kpi-timestamp">{{ card.timestamp }}</div>
  </div>
</div>
{% endfor %}"#,
    ext = "html"
)]
struct KpiCardsTemplate {
    cards: Vec<RecordView>,
}

#[derive(Template)]
#[template(
    source = r#"<div class="error-message">{{ message }}</div>"#,
    ext = "html"
)]
struct ErrorBannerTemplate<'a> {
    message: &'a str,
}

/// Table-body fragment for the recent-KPI table.
pub fn recent_table(records: &[KpiRecord]) -> Result<String, RenderError> {
    if records.is_empty() {
        return Ok(EMPTY_RECENT_TABLE.to_string());
    }
    let template = RecentRowsTemplate {
        rows: records.iter().map(RecordView::from_record).collect(),
    };
    Ok(template.render()?)
}

/// Card-list fragment for the filtered KPI view.
pub fn kpi_cards(records: &[KpiRecord]) -> Result<String, RenderError> {
    if records.is_empty() {
        return Ok(EMPTY_KPI_LIST.to_string());
    }
    let template = KpiCardsTemplate {
        cards: records.iter().map(RecordView::from_record).collect(),
    };
    Ok(template.render()?)
}

/// Status fragment for the current lifecycle state.
pub fn status_banner(state: &ViewState) -> Result<String, RenderError> {
    match state {
        ViewState::Loading => Ok(LOADING_BANNER.to_string()),
        ViewState::Success => Ok(String::new()),
        ViewState::Error(message) => Ok(ErrorBannerTemplate { message }.render()?),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
