//! Asset Tracker Server
//!
//! REST API server for university equipment tracking.

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_tracker::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{oauth::OAuthClient, sessions::init_session_store, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Kept alive until exit so buffered file logs are flushed
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Asset Tracker v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let sessions = init_session_store(&config).await?;
    tracing::info!(backend = %config.sessions.backend, "Session store ready");

    let provider = Arc::new(OAuthClient::new(
        config.oauth.clone(),
        &config.institution.email_domain,
    ));

    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    let repository = Repository::new(pool);
    let services = Arc::new(Services::new(repository, &config, sessions, provider));

    let state = AppState {
        config: Arc::new(config),
        services: services.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::new(
        server_host.parse().context("Invalid host address")?,
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = services.sessions.close().await {
        tracing::warn!("Failed to close session store: {}", e);
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// Console output (pretty or JSON) plus an optional daily rolling file
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("asset_tracker={},tower_http=debug", logging.level).into());

    let json = logging.format.eq_ignore_ascii_case("json");

    let (file_writer, guard) = match logging.directory {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "asset-tracker.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
        }))
        .init();

    guard
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/oauth/authorize", get(api::auth::oauth_authorize))
        .route("/auth/oauth/callback", post(api::auth::oauth_callback))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/me", get(api::auth::me))
        // Dashboard
        .route("/dashboard", get(api::dashboard::get_dashboard))
        .route("/navigation", get(api::dashboard::get_navigation))
        // Assets
        .route("/assets", get(api::assets::list_assets).post(api::assets::create_asset))
        .route("/assets/check-code", get(api::assets::check_code))
        .route("/assets/check-serial", get(api::assets::check_serial))
        .route("/assets/generate-code", get(api::assets::generate_code))
        .route("/assets/by-code/:code", get(api::assets::get_asset_by_code))
        .route("/assets/:id", get(api::assets::get_asset).put(api::assets::update_asset))
        .route("/assets/:id/status", put(api::assets::update_asset_status))
        .route("/assets/:id/history", get(api::assets::asset_history))
        // Issues
        .route("/issues", post(api::issues::create_issue))
        .route("/issues/active", get(api::issues::list_active_issues))
        .route("/issues/overdue", get(api::issues::list_overdue_issues))
        .route("/issues/mine", get(api::issues::my_issues))
        .route("/issues/:id", get(api::issues::get_issue))
        .route("/issues/:id/return", post(api::issues::return_issue))
        // Quick scan
        .route("/scan/return", post(api::issues::quick_return))
        .route("/scan/:code", get(api::issues::scan))
        // Users
        .route("/users", get(api::users::list_users).post(api::users::create_user))
        .route(
            "/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        // Maintenance
        .route(
            "/maintenance",
            get(api::maintenance::list_maintenance).post(api::maintenance::create_maintenance),
        )
        .route("/maintenance/summary", get(api::maintenance::maintenance_summary))
        .route("/maintenance/:id", get(api::maintenance::get_maintenance))
        .route("/maintenance/:id/start", post(api::maintenance::start_maintenance))
        .route("/maintenance/:id/complete", post(api::maintenance::complete_maintenance))
        // Categories
        .route(
            "/categories",
            get(api::categories::list_categories).post(api::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(api::categories::get_category)
                .put(api::categories::update_category)
                .delete(api::categories::delete_category),
        )
        // Departments
        .route(
            "/departments",
            get(api::departments::list_departments).post(api::departments::create_department),
        )
        .route(
            "/departments/:id",
            get(api::departments::get_department)
                .put(api::departments::update_department)
                .delete(api::departments::delete_department),
        )
        // Asset requests
        .route("/requests", get(api::requests::list_requests).post(api::requests::create_request))
        .route("/requests/mine", get(api::requests::my_requests))
        .route("/requests/:id/status", put(api::requests::review_request))
        // Audit log
        .route("/audit", get(api::audit::list_audit_logs))
        .route("/audit/summary", get(api::audit::audit_summary))
        .route("/audit/export", get(api::audit::export_audit_logs))
        // Calendar and reports
        .route("/calendar", get(api::calendar::get_calendar))
        .route("/reports", get(api::reports::get_report))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
