use crate::domain::snapshot::DashboardSnapshot;
use crate::source::{classify, DashboardSource, FetchErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data. Please refresh the page.";

#[derive(Debug, Clone)]
pub enum DashboardState {
    Idle,
    Loading,
    Ready(Arc<DashboardSnapshot>),
    Failed { message: String },
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DashboardState::Loading)
    }

    pub fn snapshot(&self) -> Option<&Arc<DashboardSnapshot>> {
        match self {
            DashboardState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Light,
    Dark,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Failed,
    /// Another cycle was already in flight; this call waited for it instead of fetching.
    Coalesced,
}

#[derive(Debug, Clone)]
struct CallFailure {
    endpoint: &'static str,
    kind: FetchErrorKind,
    error: String,
}

/// Owns the load state machine: `Idle -> Loading -> {Ready, Failed}`, and back to
/// `Loading` on every refresh.
pub struct DashboardController {
    source: Arc<dyn DashboardSource>,
    state_tx: watch::Sender<DashboardState>,
    display_mode_tx: watch::Sender<DisplayMode>,
    // Held for the whole cycle.
    in_flight: Mutex<()>,
    last_good_tx: watch::Sender<Option<Arc<DashboardSnapshot>>>,
    cycles: AtomicU64,
}

impl DashboardController {
    pub fn new(source: Arc<dyn DashboardSource>) -> Self {
        let (state_tx, _) = watch::channel(DashboardState::Idle);
        let (display_mode_tx, _) = watch::channel(DisplayMode::default());
        let (last_good_tx, _) = watch::channel(None);
        Self {
            source,
            state_tx,
            display_mode_tx,
            in_flight: Mutex::new(()),
            last_good_tx,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state_tx.subscribe()
    }

    pub fn display_mode(&self) -> DisplayMode {
        *self.display_mode_tx.borrow()
    }

    pub fn subscribe_display_mode(&self) -> watch::Receiver<DisplayMode> {
        self.display_mode_tx.subscribe()
    }

    pub fn toggle_display_mode(&self) -> DisplayMode {
        self.display_mode_tx.send_modify(|mode| *mode = mode.toggled());
        self.display_mode()
    }

    /// Last successful snapshot, kept even while the published state is `Failed`.
    pub fn last_snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.last_good_tx.borrow().clone()
    }

    pub async fn refresh(&self) -> LoadOutcome {
        self.load_dashboard().await
    }

    /// Runs one fetch cycle: all three calls in parallel, joined before any transition.
    pub async fn load_dashboard(&self) -> LoadOutcome {
        let _cycle_guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("dashboard load already in flight; coalescing");
                drop(self.in_flight.lock().await);
                return LoadOutcome::Coalesced;
            }
        };

        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        self.state_tx.send_replace(DashboardState::Loading);
        tracing::info!(cycle, source = self.source.source_name(), "dashboard load started");

        let products = {
            let source = Arc::clone(&self.source);
            tokio::spawn(async move { source.fetch_products().await })
        };
        let analytics = {
            let source = Arc::clone(&self.source);
            tokio::spawn(async move { source.fetch_analytics().await })
        };
        let pending = {
            let source = Arc::clone(&self.source);
            tokio::spawn(async move { source.fetch_pending_changes().await })
        };

        let (products, analytics, pending) = tokio::join!(products, analytics, pending);

        let mut failures = Vec::new();
        let products = settle(crate::source::PRODUCTS_PATH, products, &mut failures);
        let analytics = settle(crate::source::ANALYTICS_PATH, analytics, &mut failures);
        let pending = settle(crate::source::PENDING_CHANGES_PATH, pending, &mut failures);

        match (products, analytics, pending) {
            (Some(products), Some(analytics), Some(pending)) if failures.is_empty() => {
                let snapshot = Arc::new(DashboardSnapshot {
                    cycle,
                    fetched_at: chrono::Utc::now(),
                    products: products.products,
                    analytics,
                    pending_changes: pending.pending_changes,
                });

                tracing::info!(
                    cycle,
                    products = snapshot.products.len(),
                    pending_changes = snapshot.pending_changes.len(),
                    "dashboard load complete"
                );

                self.last_good_tx.send_replace(Some(Arc::clone(&snapshot)));
                self.state_tx.send_replace(DashboardState::Ready(snapshot));
                LoadOutcome::Ready
            }
            _ => {
                for failure in &failures {
                    tracing::error!(
                        cycle,
                        endpoint = failure.endpoint,
                        kind = %failure.kind,
                        error = %failure.error,
                        "dashboard fetch failed"
                    );
                }

                self.state_tx.send_replace(DashboardState::Failed {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                });
                LoadOutcome::Failed
            }
        }
    }
}

fn settle<T>(
    endpoint: &'static str,
    joined: Result<anyhow::Result<T>, tokio::task::JoinError>,
    failures: &mut Vec<CallFailure>,
) -> Option<T> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            failures.push(CallFailure {
                endpoint,
                kind: classify(&err),
                error: format!("{err:#}"),
            });
            None
        }
        Err(join_err) => {
            failures.push(CallFailure {
                endpoint,
                kind: FetchErrorKind::Unexpected,
                error: join_err.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analytics::AnalyticsSnapshot;
    use crate::domain::catalog::{PendingChangesResponse, ProductsResponse};
    use crate::source::{FetchError, PRODUCTS_PATH};
    use crate::metrics;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSource {
        fail_analytics: std::sync::atomic::AtomicBool,
        bad_products_shape: bool,
        fail_products: bool,
        rich_bodies: bool,
        panic_pending: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        async fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait::async_trait]
    impl DashboardSource for FakeSource {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_products(&self) -> anyhow::Result<ProductsResponse> {
            self.tick().await;
            if self.bad_products_shape {
                return Err(FetchError {
                    endpoint: PRODUCTS_PATH,
                    kind: FetchErrorKind::Shape,
                    detail: "not json".to_string(),
                }
                .into());
            }
            if self.fail_products {
                return Err(FetchError {
                    endpoint: PRODUCTS_PATH,
                    kind: FetchErrorKind::Transport,
                    detail: "connection reset".to_string(),
                }
                .into());
            }
            Ok(serde_json::from_value(json!({
                "products": [{
                    "id": 1,
                    "name": "Widget",
                    "sku": "SKU-1",
                    "category": "Tools",
                    "current_price": 100,
                    "recommended_price": 120,
                    "margin": 35,
                    "confidence": 0.92,
                    "inventory_level": 40
                }]
            }))?)
        }

        async fn fetch_analytics(&self) -> anyhow::Result<AnalyticsSnapshot> {
            self.tick().await;
            if self.fail_analytics.load(Ordering::SeqCst) {
                return Err(FetchError {
                    endpoint: crate::source::ANALYTICS_PATH,
                    kind: FetchErrorKind::Transport,
                    detail: "connection refused".to_string(),
                }
                .into());
            }
            if self.rich_bodies {
                return Ok(serde_json::from_value(json!({
                    "revenue_impact": {"revenue_lift": 10000, "revenue_lift_percentage": 7.14},
                    "summary": {"total_products": 50, "pending_approvals": 1},
                    "margin_distribution": {
                        "products_below_30": 3, "products_30_to_50": 5, "products_above_50": 2
                    }
                }))?);
            }
            Ok(AnalyticsSnapshot::default())
        }

        async fn fetch_pending_changes(&self) -> anyhow::Result<PendingChangesResponse> {
            self.tick().await;
            if self.panic_pending {
                panic!("pending handler blew up");
            }
            if self.rich_bodies {
                return Ok(serde_json::from_value(json!({
                    "pending_changes": [{
                        "id": 1,
                        "product_name": "Sony WH-1000XM5 Headphones",
                        "sku": "SKU-010",
                        "old_price": 350.0,
                        "new_price": 329.99,
                        "reason": "Competitive adjustment - Amazon pricing",
                        "confidence": 0.90,
                        "margin_after_change": 28.5
                    }]
                }))?);
            }
            Ok(PendingChangesResponse::default())
        }
    }

    fn controller(source: Arc<FakeSource>) -> DashboardController {
        DashboardController::new(source)
    }

    #[tokio::test]
    async fn starts_idle_and_becomes_ready() {
        let source = Arc::new(FakeSource::default());
        let c = controller(Arc::clone(&source));
        assert!(matches!(c.state(), DashboardState::Idle));

        assert_eq!(c.load_dashboard().await, LoadOutcome::Ready);

        let state = c.state();
        let snapshot = state.snapshot().expect("ready state");
        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.products.len(), 1);
        assert!(snapshot.pending_changes.is_empty());
        assert_eq!(snapshot.analytics.revenue_lift(), 0.0);

        let p = &snapshot.products[0];
        assert_eq!(metrics::percent_delta(p.current_price, p.recommended_price), 20.0);
        assert!(metrics::is_high_confidence(p.confidence));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn any_failure_fails_the_whole_cycle_and_retry_refetches_all() {
        let source = Arc::new(FakeSource::default());
        source.fail_analytics.store(true, Ordering::SeqCst);
        let c = controller(Arc::clone(&source));

        assert_eq!(c.load_dashboard().await, LoadOutcome::Failed);
        match c.state() {
            DashboardState::Failed { message } => assert_eq!(message, LOAD_FAILED_MESSAGE),
            other => panic!("expected failed state, got {other:?}"),
        }
        assert!(c.state().snapshot().is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        source.fail_analytics.store(false, Ordering::SeqCst);
        assert_eq!(c.refresh().await, LoadOutcome::Ready);
        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
        assert!(c.state().snapshot().is_some());
    }

    #[tokio::test]
    async fn ready_snapshot_carries_all_three_bodies() {
        let source = Arc::new(FakeSource {
            rich_bodies: true,
            ..FakeSource::default()
        });
        let c = controller(source);
        assert_eq!(c.load_dashboard().await, LoadOutcome::Ready);

        let state = c.state();
        let snapshot = state.snapshot().expect("ready state");
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.pending_changes.len(), 1);
        assert_eq!(snapshot.pending_changes[0].sku, "SKU-010");
        assert_eq!(snapshot.analytics.revenue_lift(), 10000.0);
        assert_eq!(snapshot.analytics.products_30_to_50(), 5);
    }

    #[tokio::test]
    async fn products_failure_hides_successful_siblings() {
        let source = Arc::new(FakeSource {
            rich_bodies: true,
            fail_products: true,
            ..FakeSource::default()
        });
        let c = controller(Arc::clone(&source));
        assert_eq!(c.load_dashboard().await, LoadOutcome::Failed);

        assert!(matches!(c.state(), DashboardState::Failed { .. }));
        assert!(c.state().snapshot().is_none());
        assert!(c.last_snapshot().is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retained_snapshot_is_readable_during_a_cycle() {
        let source = Arc::new(FakeSource {
            delay: Some(Duration::from_millis(20)),
            ..FakeSource::default()
        });
        let c = Arc::new(controller(source));
        assert_eq!(c.load_dashboard().await, LoadOutcome::Ready);

        let mut rx = c.subscribe();
        let task = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.refresh().await })
        };
        rx.wait_for(|s| s.is_loading()).await.unwrap();

        assert_eq!(c.last_snapshot().map(|s| s.cycle), Some(1));
        assert_eq!(task.await.unwrap(), LoadOutcome::Ready);
        assert_eq!(c.last_snapshot().map(|s| s.cycle), Some(2));
    }

    #[tokio::test]
    async fn shape_error_fails_cycle() {
        let source = Arc::new(FakeSource {
            bad_products_shape: true,
            ..FakeSource::default()
        });
        let c = controller(source);
        assert_eq!(c.load_dashboard().await, LoadOutcome::Failed);
    }

    #[tokio::test]
    async fn panicking_fetch_is_an_unexpected_failure() {
        let source = Arc::new(FakeSource {
            panic_pending: true,
            ..FakeSource::default()
        });
        let c = controller(source);
        assert_eq!(c.load_dashboard().await, LoadOutcome::Failed);
        assert!(matches!(c.state(), DashboardState::Failed { .. }));
    }

    #[tokio::test]
    async fn failed_cycle_retains_but_hides_previous_snapshot() {
        let source = Arc::new(FakeSource::default());
        let c = controller(Arc::clone(&source));
        assert_eq!(c.load_dashboard().await, LoadOutcome::Ready);

        source.fail_analytics.store(true, Ordering::SeqCst);
        assert_eq!(c.refresh().await, LoadOutcome::Failed);

        assert!(c.state().snapshot().is_none());
        let kept = c.last_snapshot().expect("retained snapshot");
        assert_eq!(kept.cycle, 1);
    }

    #[tokio::test]
    async fn repeated_refresh_yields_same_data() {
        let source = Arc::new(FakeSource::default());
        let c = controller(source);

        c.refresh().await;
        let first = c.state().snapshot().cloned().unwrap();
        c.refresh().await;
        let second = c.state().snapshot().cloned().unwrap();

        assert!(first.same_data(&second));
        assert_eq!(second.cycle, first.cycle + 1);
    }

    #[tokio::test]
    async fn concurrent_refresh_is_coalesced() {
        let source = Arc::new(FakeSource {
            delay: Some(Duration::from_millis(20)),
            ..FakeSource::default()
        });
        let c = controller(Arc::clone(&source));

        let (a, b) = tokio::join!(c.load_dashboard(), c.refresh());

        assert_eq!(a, LoadOutcome::Ready);
        assert_eq!(b, LoadOutcome::Coalesced);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(c.state().snapshot().unwrap().cycle, 1);
    }

    #[tokio::test]
    async fn subscribers_observe_loading_before_ready() {
        let source = Arc::new(FakeSource {
            delay: Some(Duration::from_millis(20)),
            ..FakeSource::default()
        });
        let c = Arc::new(controller(source));
        let mut rx = c.subscribe();

        let task = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.load_dashboard().await })
        };

        rx.wait_for(|s| s.is_loading()).await.unwrap();
        rx.wait_for(|s| s.snapshot().is_some()).await.unwrap();
        assert_eq!(task.await.unwrap(), LoadOutcome::Ready);
    }

    #[test]
    fn display_mode_toggles_without_touching_state() {
        let c = controller(Arc::new(FakeSource::default()));
        let rx = c.subscribe_display_mode();
        assert_eq!(c.display_mode(), DisplayMode::Light);
        assert_eq!(c.toggle_display_mode(), DisplayMode::Dark);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), DisplayMode::Dark);
        assert_eq!(c.toggle_display_mode(), DisplayMode::Light);
        assert!(matches!(c.state(), DashboardState::Idle));
    }
}
