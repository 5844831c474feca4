//! Dashboard controller: polling/fetch lifecycle, filter state, render
//! pipeline wiring, and the loading/error state machine.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use shared::domain::{DepartmentFilter, KpiId};
use shared::protocol::{BulkReading, NewReading};

pub mod backend;
pub mod render;
pub mod view;

pub use backend::{BulkOutcome, DashboardBackend, DashboardSnapshot, FetchError, HttpBackend};
pub use view::{ViewAnchor, ViewState, ViewTree};

/// Cadence of the scheduled refresh; no jitter, no backoff.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(300);

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    StateChanged(ViewState),
    ViewUpdated(Vec<ViewAnchor>),
    FilterChanged(DepartmentFilter),
    ReadingAccepted { kpi_id: KpiId },
    BulkAccepted { created: u64 },
}

/// Named UI actions the external controls are bound to.
#[derive(Debug, Clone)]
pub enum UiAction {
    RefreshDashboard,
    SetFilter { value: String },
    SubmitReading { kpi_id: KpiId, reading: NewReading },
    SubmitBulk { readings: Vec<BulkReading> },
}

impl UiAction {
    fn name(&self) -> &'static str {
        match self {
            UiAction::RefreshDashboard => "refresh_dashboard",
            UiAction::SetFilter { .. } => "set_filter",
            UiAction::SubmitReading { .. } => "submit_reading",
            UiAction::SubmitBulk { .. } => "submit_bulk",
        }
    }
}

pub struct DashboardController {
    backend: Arc<dyn DashboardBackend>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

struct ControllerState {
    filter: DepartmentFilter,
    view_state: ViewState,
    view: ViewTree,
    /// Tokens guarding the summary+recent view against out-of-order
    /// completions: a response is applied only while its token is still
    /// the latest issued for that view.
    dashboard_generation: u64,
    list_generation: u64,
}

impl DashboardController {
    pub fn new(backend: Arc<dyn DashboardBackend>, view: ViewTree) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut state = ControllerState {
            filter: DepartmentFilter::All,
            view_state: ViewState::Loading,
            view,
            dashboard_generation: 0,
            list_generation: 0,
        };
        Self::apply_state(&mut state, &ViewState::Loading);
        Arc::new(Self {
            backend,
            inner: Mutex::new(state),
            events,
            poll_task: Mutex::new(None),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn view_state(&self) -> ViewState {
        self.inner.lock().await.view_state.clone()
    }

    pub async fn filter(&self) -> DepartmentFilter {
        self.inner.lock().await.filter.clone()
    }

    pub async fn region(&self, anchor: ViewAnchor) -> Option<String> {
        self.inner
            .lock()
            .await
            .view
            .content(anchor)
            .map(str::to_string)
    }

    /// Routes a named UI action to the matching controller method.
    pub async fn dispatch(&self, action: UiAction) {
        debug!(action = action.name(), "dispatching ui action");
        match action {
            UiAction::RefreshDashboard => self.refresh_dashboard().await,
            UiAction::SetFilter { value } => self.set_filter(&value).await,
            UiAction::SubmitReading { kpi_id, reading } => {
                let _ = self.submit_reading(kpi_id, reading).await;
            }
            UiAction::SubmitBulk { readings } => {
                let _ = self.submit_bulk(readings).await;
            }
        }
    }

    /// One full refresh cycle: summary counters plus the recent-KPI
    /// table. The filtered list keeps whatever it last showed.
    pub async fn refresh_dashboard(&self) {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.dashboard_generation += 1;
            Self::apply_state(&mut inner, &ViewState::Loading);
            inner.dashboard_generation
        };
        let _ = self
            .events
            .send(ControllerEvent::StateChanged(ViewState::Loading));
        debug!(generation, "dashboard refresh started");

        let result = self.backend.fetch_dashboard().await;

        let (state, updated) = {
            let mut inner = self.inner.lock().await;
            if inner.dashboard_generation != generation {
                debug!(
                    generation,
                    latest = inner.dashboard_generation,
                    "discarding stale dashboard response"
                );
                return;
            }
            match result {
                Ok(snapshot) => match Self::apply_dashboard(&mut inner, &snapshot) {
                    Ok(updated) => {
                        Self::apply_state(&mut inner, &ViewState::Success);
                        (ViewState::Success, updated)
                    }
                    Err(err) => Self::fail_locked(&mut inner, err.to_string()),
                },
                Err(err) => Self::fail_locked(&mut inner, err.to_string()),
            }
        };
        if !updated.is_empty() {
            let _ = self.events.send(ControllerEvent::ViewUpdated(updated));
        }
        let _ = self.events.send(ControllerEvent::StateChanged(state));
    }

    /// Refreshes the filtered KPI card list only; the summary fetch is
    /// never involved.
    pub async fn refresh_kpi_list(&self) {
        let (generation, filter) = {
            let mut inner = self.inner.lock().await;
            inner.list_generation += 1;
            Self::apply_state(&mut inner, &ViewState::Loading);
            (inner.list_generation, inner.filter.clone())
        };
        let _ = self
            .events
            .send(ControllerEvent::StateChanged(ViewState::Loading));
        debug!(generation, %filter, "kpi list refresh started");

        let result = self.backend.fetch_kpis(&filter).await;

        let (state, updated) = {
            let mut inner = self.inner.lock().await;
            if inner.list_generation != generation {
                debug!(
                    generation,
                    latest = inner.list_generation,
                    "discarding stale kpi list response"
                );
                return;
            }
            match result {
                Ok(records) => match render::kpi_cards(&records) {
                    Ok(fragment) => {
                        let mut updated = Vec::new();
                        if inner.view.replace(ViewAnchor::KpiList, fragment) {
                            updated.push(ViewAnchor::KpiList);
                        }
                        Self::apply_state(&mut inner, &ViewState::Success);
                        (ViewState::Success, updated)
                    }
                    Err(err) => Self::fail_locked(&mut inner, err.to_string()),
                },
                Err(err) => Self::fail_locked(&mut inner, err.to_string()),
            }
        };
        if !updated.is_empty() {
            let _ = self.events.send(ControllerEvent::ViewUpdated(updated));
        }
        let _ = self.events.send(ControllerEvent::StateChanged(state));
    }

    /// Replaces the active filter and triggers a list-only refresh.
    pub async fn set_filter(&self, raw: &str) {
        let filter = DepartmentFilter::parse(raw);
        {
            let mut inner = self.inner.lock().await;
            inner.filter = filter.clone();
        }
        info!(%filter, "department filter changed");
        let _ = self.events.send(ControllerEvent::FilterChanged(filter));
        self.refresh_kpi_list().await;
    }

    /// Hands one reading to the service, then refreshes the dashboard so
    /// the new data point shows up.
    pub async fn submit_reading(
        &self,
        kpi_id: KpiId,
        reading: NewReading,
    ) -> Result<(), FetchError> {
        match self.backend.submit_reading(kpi_id, &reading).await {
            Ok(()) => {
                info!(kpi_id = kpi_id.0, "kpi reading accepted");
                let _ = self.events.send(ControllerEvent::ReadingAccepted { kpi_id });
                self.refresh_dashboard().await;
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string()).await;
                Err(err)
            }
        }
    }

    pub async fn submit_bulk(&self, readings: Vec<BulkReading>) -> Result<BulkOutcome, FetchError> {
        match self.backend.submit_bulk(&readings).await {
            Ok(outcome) => {
                info!(
                    created = outcome.created,
                    rejected = outcome.errors.len(),
                    "bulk readings accepted"
                );
                let _ = self.events.send(ControllerEvent::BulkAccepted {
                    created: outcome.created,
                });
                self.refresh_dashboard().await;
                Ok(outcome)
            }
            Err(err) => {
                self.fail(err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Starts the one persistent scheduled-refresh task. Each tick goes
    /// through the same path as a manual refresh and is not held back by
    /// an outstanding cycle. Calling again replaces the previous task.
    pub async fn start_polling(self: &Arc<Self>, period: Duration) {
        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; the initial paint is
            // the caller's explicit refresh.
            interval.tick().await;
            loop {
                interval.tick().await;
                debug!("scheduled dashboard refresh");
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    controller.refresh_dashboard().await;
                });
            }
        });
        if let Some(previous) = self.poll_task.lock().await.replace(handle) {
            previous.abort();
        }
        info!(period_secs = period.as_secs(), "poll task started");
    }

    /// Cancels the scheduled-refresh task on teardown.
    pub async fn shutdown(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
            info!("poll task stopped");
        }
    }

    fn apply_dashboard(
        inner: &mut ControllerState,
        snapshot: &DashboardSnapshot,
    ) -> Result<Vec<ViewAnchor>, render::RenderError> {
        let mut updated = Vec::new();
        for (anchor, text) in render::summary_counters(&snapshot.summary) {
            if inner.view.replace(anchor, text) {
                updated.push(anchor);
            }
        }
        let table = render::recent_table(&snapshot.recent)?;
        if inner.view.replace(ViewAnchor::RecentKpis, table) {
            updated.push(ViewAnchor::RecentKpis);
        }
        Ok(updated)
    }

    fn apply_state(inner: &mut ControllerState, state: &ViewState) {
        match render::status_banner(state) {
            Ok(banner) => {
                inner.view.replace(ViewAnchor::StatusBanner, banner);
            }
            Err(err) => warn!(error = %err, "status banner rendering failed"),
        }
        inner.view_state = state.clone();
    }

    fn fail_locked(inner: &mut ControllerState, message: String) -> (ViewState, Vec<ViewAnchor>) {
        warn!(error = %message, "refresh failed");
        let state = ViewState::Error(message);
        Self::apply_state(inner, &state);
        (state, Vec::new())
    }

    async fn fail(&self, message: String) {
        let state = {
            let mut inner = self.inner.lock().await;
            let (state, _) = Self::fail_locked(&mut inner, message);
            state
        };
        let _ = self.events.send(ControllerEvent::StateChanged(state));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
