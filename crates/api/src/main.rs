use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use squadhq_core::external::{
    NullReputationSource, NullVouchSource, ReputationSource, VouchSource,
};
use squadhq_events::{EventBus, Notifier};
use squadhq_workflows::{InviteService, PositionService, SquadService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squadhq_api::clients::{HttpReputationSource, HttpVouchSource};
use squadhq_api::config::ServerConfig;
use squadhq_api::router::build_app_router;
use squadhq_api::state::AppState;
use squadhq_api::background;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squadhq_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:squadhq.db".into());

    let pool = squadhq_db::create_pool(&database_url)
        .await
        .expect("Failed to open database");
    tracing::info!("Database connection pool created");

    squadhq_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    squadhq_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- Event bus + notification sink ---
    let event_bus = Arc::new(EventBus::default());
    let notifier = Arc::new(Notifier::new(pool.clone(), Arc::clone(&event_bus)));

    // --- External collaborators ---
    let reputation: Arc<dyn ReputationSource> = match &config.reputation_api_url {
        Some(url) => Arc::new(HttpReputationSource::new(url.clone())),
        None => {
            tracing::warn!("REPUTATION_API_URL not set; all users will read as unscored");
            Arc::new(NullReputationSource)
        }
    };
    let vouch: Arc<dyn VouchSource> = match &config.vouch_api_url {
        Some(url) => Arc::new(HttpVouchSource::new(url.clone())),
        None => {
            tracing::warn!("VOUCH_API_URL not set; vouch-gated positions will reject strangers");
            Arc::new(NullVouchSource)
        }
    };

    // --- Workflow services ---
    let squads = Arc::new(SquadService::new(
        pool.clone(),
        Arc::clone(&reputation),
        Arc::clone(&notifier),
    ));
    let invites = Arc::new(InviteService::new(pool.clone(), Arc::clone(&notifier)));
    let positions = Arc::new(PositionService::new(
        pool.clone(),
        Arc::clone(&reputation),
        Arc::clone(&vouch),
        Arc::clone(&notifier),
    ));

    // --- Expiry sweep ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = tokio::spawn(background::expiry::run(
        Arc::clone(&positions),
        config.expiry_sweep_interval_secs,
        sweep_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        squads,
        invites,
        positions,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Expiry sweep stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
