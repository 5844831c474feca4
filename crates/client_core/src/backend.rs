//! HTTP access to the KPI service endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use url::Url;

use shared::domain::{DepartmentFilter, KpiId};
use shared::protocol::{
    BulkReading, BulkSubmitResponse, DashboardDataResponse, DashboardSummary, DepartmentListResponse,
    DepartmentSummary, KpiListResponse, KpiRecord, NewReading, SubmitResponse,
};

/// Why a fetch produced no usable payload. Callers decide what happens
/// next; no retries are attempted here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not complete (network, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Parse(String),
    /// The service answered with `success: false`; the message is the
    /// server-supplied error string.
    #[error("{0}")]
    Application(String),
}

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub summary: DashboardSummary,
    pub recent: Vec<KpiRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub created: u64,
    pub errors: Vec<String>,
}

#[async_trait]
pub trait DashboardBackend: Send + Sync {
    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, FetchError>;
    async fn fetch_kpis(&self, filter: &DepartmentFilter) -> Result<Vec<KpiRecord>, FetchError>;
    async fn fetch_departments(&self) -> Result<Vec<DepartmentSummary>, FetchError>;
    async fn submit_reading(&self, kpi_id: KpiId, reading: &NewReading) -> Result<(), FetchError>;
    async fn submit_bulk(&self, readings: &[BulkReading]) -> Result<BulkOutcome, FetchError>;
}

#[derive(Debug)]
pub struct HttpBackend {
    http: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(server_url)
            .map_err(|err| FetchError::Transport(format!("invalid server url {server_url}: {err}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|err| FetchError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    // Error bodies still carry the response envelope, so the status code
    // is never used to short-circuit; the body decides.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| FetchError::Parse(err.to_string()))
    }

    async fn post_json<B, T>(&self, url: Url, payload: &B) -> Result<T, FetchError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| FetchError::Parse(err.to_string()))
    }
}

fn envelope_failure(error: Option<String>, operation: &str) -> FetchError {
    FetchError::Application(
        error.unwrap_or_else(|| format!("{operation} failed without a server message")),
    )
}

#[async_trait]
impl DashboardBackend for HttpBackend {
    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, FetchError> {
        let url = self.endpoint("api/dashboard-data")?;
        let body: DashboardDataResponse = self.get_json(url).await?;
        if !body.success {
            return Err(envelope_failure(body.error, "dashboard fetch"));
        }
        let summary = body
            .summary
            .ok_or_else(|| FetchError::Parse("dashboard response is missing its summary".to_string()))?;
        Ok(DashboardSnapshot {
            summary,
            recent: body.recent_kpis,
        })
    }

    async fn fetch_kpis(&self, filter: &DepartmentFilter) -> Result<Vec<KpiRecord>, FetchError> {
        let mut url = self.endpoint("api/kpi/")?;
        if let Some(id) = filter.department_id() {
            url.query_pairs_mut().append_pair("department_id", id);
        }
        tracing::debug!(%url, "fetching kpi list");
        let body: KpiListResponse = self.get_json(url).await?;
        if !body.success {
            return Err(envelope_failure(body.error, "kpi list fetch"));
        }
        Ok(body.data)
    }

    async fn fetch_departments(&self) -> Result<Vec<DepartmentSummary>, FetchError> {
        let url = self.endpoint("api/departments/")?;
        let body: DepartmentListResponse = self.get_json(url).await?;
        if !body.success {
            return Err(envelope_failure(body.error, "department list fetch"));
        }
        Ok(body.data)
    }

    async fn submit_reading(&self, kpi_id: KpiId, reading: &NewReading) -> Result<(), FetchError> {
        let url = self.endpoint(&format!("api/kpi/{}/data", kpi_id.0))?;
        let body: SubmitResponse = self.post_json(url, reading).await?;
        if !body.success {
            return Err(envelope_failure(body.error, "reading submission"));
        }
        Ok(())
    }

    async fn submit_bulk(&self, readings: &[BulkReading]) -> Result<BulkOutcome, FetchError> {
        let url = self.endpoint("api/kpi/data/bulk")?;
        let body: BulkSubmitResponse = self.post_json(url, &readings).await?;
        if !body.success {
            return Err(envelope_failure(body.error, "bulk submission"));
        }
        Ok(BulkOutcome {
            created: body.created_count,
            errors: body.errors,
        })
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
