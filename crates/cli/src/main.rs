use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use priceopt_core::controller::{DashboardController, DashboardState};
use priceopt_core::source::HttpDashboardSource;
use priceopt_core::view::DashboardView;

mod render;

#[derive(Debug, Parser)]
#[command(name = "priceopt_cli")]
struct Args {
    /// Pricing service base URL. Defaults to PRICEOPT_API_BASE.
    #[arg(long)]
    base_url: Option<String>,

    /// Print the derived dashboard view as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = priceopt_core::config::Settings::from_env()?;
    let sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(base_url) = args.base_url {
        settings = settings.with_api_base(base_url);
    }

    let source = HttpDashboardSource::from_settings(&settings)?;
    let controller = DashboardController::new(Arc::new(source));
    let outcome = controller.load_dashboard().await;
    tracing::info!(?outcome, base_url = settings.require_api_base()?, "dashboard load settled");

    match controller.state() {
        DashboardState::Ready(snapshot) => {
            let view = DashboardView::from_snapshot(&snapshot);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render::render_dashboard(&view));
            }
            Ok(())
        }
        DashboardState::Failed { message } => {
            let err = anyhow::anyhow!("dashboard load failed");
            sentry_anyhow::capture_anyhow(&err);
            eprintln!("{message}");
            // Flush pending reports before exiting with a failure status.
            drop(sentry_guard);
            std::process::exit(1);
        }
        DashboardState::Idle | DashboardState::Loading => {
            anyhow::bail!("dashboard load did not settle")
        }
    }
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
