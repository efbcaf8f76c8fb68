use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use priceopt_core::controller::{DashboardController, DashboardState, DisplayMode};
use priceopt_core::source::HttpDashboardSource;
use priceopt_core::view::DashboardView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = priceopt_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source = HttpDashboardSource::from_settings(&settings).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;
    tracing::info!(base_url = source.base_url(), "dashboard source configured");

    let controller = Arc::new(DashboardController::new(Arc::new(source)));
    spawn_load(&controller);

    let app = router(AppState { controller });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/display-mode", get(get_display_mode))
        .route("/display-mode/toggle", post(toggle_display_mode))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    controller: Arc<DashboardController>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
enum ApiDashboard {
    Loading,
    Ready {
        cycle: u64,
        fetched_at: DateTime<Utc>,
        view: DashboardView,
    },
    Failed {
        message: String,
    },
}

impl From<DashboardState> for ApiDashboard {
    fn from(state: DashboardState) -> Self {
        match state {
            // The first cycle starts at boot; callers only ever see it as loading.
            DashboardState::Idle | DashboardState::Loading => ApiDashboard::Loading,
            DashboardState::Ready(snapshot) => ApiDashboard::Ready {
                cycle: snapshot.cycle,
                fetched_at: snapshot.fetched_at,
                view: DashboardView::from_snapshot(&snapshot),
            },
            DashboardState::Failed { message } => ApiDashboard::Failed { message },
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiDisplayMode {
    mode: DisplayMode,
}

async fn get_dashboard(State(state): State<AppState>) -> Json<ApiDashboard> {
    Json(state.controller.state().into())
}

async fn refresh_dashboard(State(state): State<AppState>) -> (StatusCode, Json<ApiDashboard>) {
    spawn_load(&state.controller);
    // The spawned cycle may not have published Loading yet.
    (StatusCode::ACCEPTED, Json(ApiDashboard::Loading))
}

async fn get_display_mode(State(state): State<AppState>) -> Json<ApiDisplayMode> {
    Json(ApiDisplayMode {
        mode: state.controller.display_mode(),
    })
}

async fn toggle_display_mode(State(state): State<AppState>) -> Json<ApiDisplayMode> {
    Json(ApiDisplayMode {
        mode: state.controller.toggle_display_mode(),
    })
}

fn spawn_load(controller: &Arc<DashboardController>) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let outcome = controller.load_dashboard().await;
        tracing::debug!(?outcome, "dashboard load settled");
    });
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &priceopt_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
