use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::oneshot;

use shared::protocol::{DashboardSummary, KpiRecord, ReadingPeriod};

type DashboardResult = Result<DashboardSnapshot, FetchError>;

#[derive(Default)]
struct FakeBackend {
    dashboard_calls: AtomicUsize,
    kpi_calls: AtomicUsize,
    filters_seen: Mutex<Vec<DepartmentFilter>>,
    /// Front-first queue of gates; a call holding a gate resolves only
    /// when the test fires the matching sender.
    dashboard_gates: Mutex<Vec<oneshot::Receiver<DashboardResult>>>,
    dashboard_error: Mutex<Option<String>>,
    kpi_error: Mutex<Option<String>>,
    submit_error: Mutex<Option<String>>,
    kpi_records: Mutex<Vec<KpiRecord>>,
    submissions: Mutex<Vec<(KpiId, NewReading)>>,
}

fn sample_summary(points: u64) -> DashboardSummary {
    DashboardSummary {
        total_departments: 3,
        total_kpis: 12,
        total_data_points: points,
    }
}

fn sample_record() -> KpiRecord {
    KpiRecord {
        kpi_name: "Revenue".to_string(),
        department: "Sales".to_string(),
        value: 95.5,
        target: Some(90.0),
        performance: "Above Target".to_string(),
        timestamp: "2024-01-15T10:30:00Z".to_string(),
    }
}

fn sample_snapshot(points: u64) -> DashboardSnapshot {
    DashboardSnapshot {
        summary: sample_summary(points),
        recent: vec![sample_record()],
    }
}

fn reading(value: f64) -> NewReading {
    NewReading {
        value,
        target: None,
        period: ReadingPeriod::Daily,
        notes: None,
        created_by: None,
    }
}

#[async_trait]
impl DashboardBackend for FakeBackend {
    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, FetchError> {
        self.dashboard_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.dashboard_error.lock().await.clone() {
            return Err(FetchError::Application(message));
        }
        let gate = {
            let mut gates = self.dashboard_gates.lock().await;
            if gates.is_empty() {
                None
            } else {
                Some(gates.remove(0))
            }
        };
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(FetchError::Transport("gate dropped".to_string()))),
            None => Ok(sample_snapshot(12450)),
        }
    }

    async fn fetch_kpis(
        &self,
        filter: &DepartmentFilter,
    ) -> Result<Vec<KpiRecord>, FetchError> {
        self.kpi_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.kpi_error.lock().await.clone() {
            return Err(FetchError::Application(message));
        }
        self.filters_seen.lock().await.push(filter.clone());
        Ok(self.kpi_records.lock().await.clone())
    }

    async fn fetch_departments(
        &self,
    ) -> Result<Vec<shared::protocol::DepartmentSummary>, FetchError> {
        Ok(Vec::new())
    }

    async fn submit_reading(
        &self,
        kpi_id: KpiId,
        reading: &NewReading,
    ) -> Result<(), FetchError> {
        if let Some(message) = self.submit_error.lock().await.clone() {
            return Err(FetchError::Application(message));
        }
        self.submissions.lock().await.push((kpi_id, reading.clone()));
        Ok(())
    }

    async fn submit_bulk(&self, readings: &[BulkReading]) -> Result<BulkOutcome, FetchError> {
        if let Some(message) = self.submit_error.lock().await.clone() {
            return Err(FetchError::Application(message));
        }
        Ok(BulkOutcome {
            created: readings.len() as u64,
            errors: Vec::new(),
        })
    }
}

#[tokio::test]
async fn starts_in_loading_with_the_default_filter() {
    let controller = DashboardController::new(Arc::new(FakeBackend::default()), ViewTree::full());
    assert_eq!(controller.view_state().await, ViewState::Loading);
    assert_eq!(controller.filter().await, DepartmentFilter::All);
    let banner = controller
        .region(ViewAnchor::StatusBanner)
        .await
        .expect("banner present");
    assert!(banner.contains("loading-indicator"));
}

#[tokio::test]
async fn successful_refresh_renders_counters_and_recent_table() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.refresh_dashboard().await;

    assert_eq!(controller.view_state().await, ViewState::Success);
    assert_eq!(
        controller.region(ViewAnchor::TotalDepartments).await.as_deref(),
        Some("3")
    );
    assert_eq!(
        controller.region(ViewAnchor::TotalDataPoints).await.as_deref(),
        Some("12,450")
    );
    let recent = controller
        .region(ViewAnchor::RecentKpis)
        .await
        .expect("recent table present");
    assert!(recent.contains("Revenue"));
    assert!(recent.contains("performance-badge above"));
    assert_eq!(
        controller.region(ViewAnchor::StatusBanner).await.as_deref(),
        Some("")
    );
}

#[tokio::test]
async fn failed_fetch_transitions_to_error_with_the_server_message() {
    let backend = Arc::new(FakeBackend::default());
    *backend.dashboard_error.lock().await = Some("db down".to_string());
    let controller = DashboardController::new(backend, ViewTree::full());

    controller.refresh_dashboard().await;

    match controller.view_state().await {
        ViewState::Error(message) => assert!(message.contains("db down")),
        other => panic!("unexpected state: {other:?}"),
    }
    let banner = controller
        .region(ViewAnchor::StatusBanner)
        .await
        .expect("banner present");
    assert!(banner.contains("db down"));
}

#[tokio::test]
async fn error_state_clears_on_the_next_successful_refresh() {
    let backend = Arc::new(FakeBackend::default());
    *backend.dashboard_error.lock().await = Some("db down".to_string());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.refresh_dashboard().await;
    assert!(controller.view_state().await.error_message().is_some());

    *backend.dashboard_error.lock().await = None;
    controller.refresh_dashboard().await;
    assert_eq!(controller.view_state().await, ViewState::Success);
}

#[tokio::test]
async fn refresh_emits_loading_view_update_and_success() {
    let controller = DashboardController::new(Arc::new(FakeBackend::default()), ViewTree::full());
    let mut events = controller.subscribe_events();

    controller.refresh_dashboard().await;

    match events.recv().await.expect("event") {
        ControllerEvent::StateChanged(ViewState::Loading) => {}
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("event") {
        ControllerEvent::ViewUpdated(anchors) => {
            assert!(anchors.contains(&ViewAnchor::TotalDepartments));
            assert!(anchors.contains(&ViewAnchor::RecentKpis));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("event") {
        ControllerEvent::StateChanged(ViewState::Success) => {}
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn set_filter_refreshes_the_list_without_touching_the_summary() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.refresh_dashboard().await;
    let dashboard_calls = backend.dashboard_calls.load(Ordering::SeqCst);

    controller.set_filter("7").await;

    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), dashboard_calls);
    assert_eq!(backend.kpi_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        controller.filter().await,
        DepartmentFilter::Department("7".to_string())
    );
    let filters = backend.filters_seen.lock().await;
    assert_eq!(
        filters.as_slice(),
        [DepartmentFilter::Department("7".to_string())]
    );
    drop(filters);
    // No records configured, so the list shows its explicit empty state.
    let list = controller
        .region(ViewAnchor::KpiList)
        .await
        .expect("list present");
    assert!(list.contains("No KPIs found"));
}

#[tokio::test]
async fn empty_and_all_filter_values_request_the_unfiltered_list() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.set_filter("").await;
    controller.set_filter("all").await;

    let filters = backend.filters_seen.lock().await;
    assert_eq!(
        filters.as_slice(),
        [DepartmentFilter::All, DepartmentFilter::All]
    );
}

#[tokio::test]
async fn list_fetch_failure_reaches_the_error_state() {
    let backend = Arc::new(FakeBackend::default());
    *backend.kpi_error.lock().await = Some("department not found".to_string());
    let controller = DashboardController::new(backend, ViewTree::full());

    controller.set_filter("42").await;

    match controller.view_state().await {
        ViewState::Error(message) => assert!(message.contains("department not found")),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn stale_dashboard_response_is_discarded() {
    let backend = Arc::new(FakeBackend::default());
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    backend
        .dashboard_gates
        .lock()
        .await
        .extend([first_rx, second_rx]);
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.refresh_dashboard().await })
    };
    while backend.dashboard_calls.load(Ordering::SeqCst) < 1 {
        tokio::task::yield_now().await;
    }
    let second = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.refresh_dashboard().await })
    };
    while backend.dashboard_calls.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }

    // The later refresh resolves first and paints the view.
    second_tx
        .send(Ok(sample_snapshot(222)))
        .expect("second gate receiver alive");
    second.await.expect("join second refresh");
    assert_eq!(
        controller.region(ViewAnchor::TotalDataPoints).await.as_deref(),
        Some("222")
    );

    // The stale response arrives afterwards and must not overwrite it.
    first_tx
        .send(Ok(sample_snapshot(111)))
        .expect("first gate receiver alive");
    first.await.expect("join first refresh");
    assert_eq!(
        controller.region(ViewAnchor::TotalDataPoints).await.as_deref(),
        Some("222")
    );
    assert_eq!(controller.view_state().await, ViewState::Success);
}

#[tokio::test]
async fn accepted_submission_triggers_a_dashboard_refresh() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller
        .submit_reading(KpiId(5), reading(95.5))
        .await
        .expect("submit");

    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), 1);
    let submissions = backend.submissions.lock().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].0, KpiId(5));
    assert_eq!(submissions[0].1.value, 95.5);
    drop(submissions);
    assert_eq!(controller.view_state().await, ViewState::Success);
}

#[tokio::test]
async fn rejected_submission_surfaces_the_error_without_refreshing() {
    let backend = Arc::new(FakeBackend::default());
    *backend.submit_error.lock().await = Some("Missing required field: value".to_string());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    let err = controller
        .submit_reading(KpiId(5), reading(95.5))
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::Application(_)));
    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), 0);
    match controller.view_state().await {
        ViewState::Error(message) => assert!(message.contains("Missing required field")),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn bulk_submission_reports_its_outcome_and_refreshes() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    let readings = vec![
        BulkReading {
            kpi_id: KpiId(4),
            reading: reading(12.0),
        },
        BulkReading {
            kpi_id: KpiId(6),
            reading: reading(7.5),
        },
    ];
    let outcome = controller.submit_bulk(readings).await.expect("bulk");
    assert_eq!(outcome.created, 2);
    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispatch_routes_named_actions_to_their_methods() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.dispatch(UiAction::RefreshDashboard).await;
    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), 1);

    controller
        .dispatch(UiAction::SetFilter {
            value: "9".to_string(),
        })
        .await;
    let filters = backend.filters_seen.lock().await;
    assert_eq!(
        filters.as_slice(),
        [DepartmentFilter::Department("9".to_string())]
    );
}

#[tokio::test]
async fn absent_anchors_are_tolerated_during_refresh() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(
        backend,
        ViewTree::with_anchors([ViewAnchor::TotalKpis]),
    );
    let mut events = controller.subscribe_events();

    controller.refresh_dashboard().await;

    assert_eq!(controller.view_state().await, ViewState::Success);
    assert_eq!(controller.region(ViewAnchor::RecentKpis).await, None);
    assert_eq!(
        controller.region(ViewAnchor::TotalKpis).await.as_deref(),
        Some("12")
    );

    // Only the present anchor shows up in the update notification.
    events.recv().await.expect("loading event");
    match events.recv().await.expect("event") {
        ControllerEvent::ViewUpdated(anchors) => {
            assert_eq!(anchors, vec![ViewAnchor::TotalKpis]);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn poll_task_refreshes_on_cadence_until_shutdown() {
    let backend = Arc::new(FakeBackend::default());
    let controller = DashboardController::new(backend.clone(), ViewTree::full());

    controller.start_polling(Duration::from_secs(300)).await;

    // No immediate refresh: the first paint belongs to the caller.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(301)).await;
    while backend.dashboard_calls.load(Ordering::SeqCst) < 1 {
        tokio::task::yield_now().await;
    }

    tokio::time::sleep(Duration::from_secs(300)).await;
    while backend.dashboard_calls.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }

    controller.shutdown().await;
    let calls = backend.dashboard_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(1200)).await;
    assert_eq!(backend.dashboard_calls.load(Ordering::SeqCst), calls);
}
