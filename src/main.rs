use axum::{
    routing::{get, post},
    Json, Router,
};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info};

use wari_refunds::api::refunds::{self, RefundState};
use wari_refunds::config::AppConfig;
use wari_refunds::database::refund_attempt_repository::RefundAttemptRepository;
use wari_refunds::database::transaction_repository::TransactionRepository;
use wari_refunds::database;
use wari_refunds::gateway::wave::WaveGateway;
use wari_refunds::health::{HealthChecker, HealthState, HealthStatus};
use wari_refunds::logging::init_tracing_with;
use wari_refunds::middleware::logging::{request_logging_middleware, UuidRequestId};
use wari_refunds::refund::processor::RefundProcessor;
use wari_refunds::refund::reconciliation::TracingAlertSink;
use wari_refunds::services::ledger::HttpLedgerClient;
use wari_refunds::services::merchant_directory::HttpMerchantDirectory;

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    config.validate()?;

    init_tracing_with(&config.logging);

    let skip_externals = std::env::var("SKIP_EXTERNALS")
        .unwrap_or_else(|_| "false".to_string())
        .to_lowercase()
        == "true";

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        "🚀 Starting Wari refunds service"
    );

    // Initialize database connection pool
    let db_pool = if skip_externals {
        info!("⏭️  Skipping database initialization (SKIP_EXTERNALS=true)");
        None
    } else {
        info!("📊 Initializing database connection pool...");
        let db_pool = database::init_pool_from_config(&config.database)
            .await
            .map_err(|e| {
                error!("Failed to initialize database pool: {}", e);
                anyhow::anyhow!(e)
            })?;

        info!(
            max_connections = db_pool.options().get_max_connections(),
            "✅ Database connection pool initialized"
        );
        Some(db_pool)
    };

    // Initialize health checker
    let health_checker = HealthChecker::new(db_pool.clone());

    // Wire up the refund pipeline when a database is available
    let refund_routes = if let Some(pool) = db_pool.clone() {
        let transaction_repo = Arc::new(TransactionRepository::new(pool.clone()));
        let attempt_repo = Arc::new(RefundAttemptRepository::new(pool));

        let gateway = Arc::new(WaveGateway::from_env().map_err(|e| {
            error!("❌ Failed to initialize Wave gateway: {}", e);
            anyhow::anyhow!(e)
        })?);
        let ledger = Arc::new(HttpLedgerClient::from_env().map_err(|e| {
            error!("❌ Failed to initialize ledger client: {}", e);
            anyhow::anyhow!(e)
        })?);
        let directory = Arc::new(HttpMerchantDirectory::from_env().map_err(|e| {
            error!("❌ Failed to initialize merchant directory: {}", e);
            anyhow::anyhow!(e)
        })?);

        let processor = Arc::new(RefundProcessor::new(
            transaction_repo,
            directory,
            gateway,
            ledger,
            Arc::new(TracingAlertSink),
        ));

        info!("✅ Refund processor initialized");

        let refund_state = RefundState {
            processor,
            attempts: Some(attempt_repo),
        };

        Router::new()
            .route(
                "/api/refunds/eligibility/{transaction_id}",
                get(refunds::get_eligibility),
            )
            .route("/api/refunds/preview", post(refunds::preview_refund))
            .route("/api/refunds", post(refunds::execute_refund))
            .route(
                "/api/refunds/attempts/{transaction_id}",
                get(refunds::list_attempts),
            )
            .with_state(refund_state)
    } else {
        info!("⏭️  Skipping refund routes (no database)");
        Router::new()
    };

    info!("🛣️  Setting up application routes...");

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/health/live", get(liveness))
        .merge(refund_routes)
        .with_state(AppState { health_checker })
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    info!("✅ Routes configured");

    // Run the server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "🚀 Server listening on http://{}", addr);
    info!("✅ Server is ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}

// Application state
#[derive(Clone)]
struct AppState {
    health_checker: HealthChecker,
}

// Handlers
async fn root() -> &'static str {
    "Welcome to Wari Refunds API"
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    let health_status = state.health_checker.check_health().await;

    // Return 503 if any component is unhealthy
    if matches!(health_status.status, HealthState::Unhealthy) {
        error!("❌ Health check failed - service unhealthy");
        Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ))
    } else {
        Ok(Json(health_status))
    }
}

/// Readiness probe - checks if the service is ready to accept traffic
async fn readiness(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    health(axum::extract::State(state)).await
}

/// Liveness probe - checks if the service is alive (basic check)
async fn liveness() -> Result<&'static str, (axum::http::StatusCode, String)> {
    Ok("OK")
}
