use serde::{Deserialize, Serialize};

use crate::domain::{DepartmentId, KpiId};

/// Aggregate counters shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_departments: u64,
    pub total_kpis: u64,
    pub total_data_points: u64,
}

/// One KPI reading as served by the dashboard and list endpoints.
///
/// The list endpoint historically spelled two of these fields
/// `department_name` and `performance_status`; both spellings are
/// accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    #[serde(default)]
    pub kpi_name: String,
    #[serde(default, alias = "department_name")]
    pub department: String,
    pub value: f64,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default, alias = "performance_status")]
    pub performance: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardDataResponse {
    pub success: bool,
    #[serde(default)]
    pub summary: Option<DashboardSummary>,
    #[serde(default)]
    pub recent_kpis: Vec<KpiRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiListResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<KpiRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kpi_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentListResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<DepartmentSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

/// Submission payload for `POST /api/kpi/<id>/data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(default)]
    pub period: ReadingPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// One element of the `POST /api/kpi/data/bulk` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkReading {
    pub kpi_id: KpiId,
    #[serde(flatten)]
    pub reading: NewReading,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub created_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
