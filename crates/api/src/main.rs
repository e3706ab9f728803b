use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use resonant_api::auth::identity::JwtIdentityProvider;
use resonant_api::auth::password::CredentialHasher;
use resonant_api::config::ServerConfig;
use resonant_api::router::build_app_router;
use resonant_api::services::onboarding::{sweep_expired, OnboardingRegistry, SWEEP_INTERVAL};
use resonant_api::state::AppState;
use resonant_blobstore::BlobPublisher;
use resonant_core::session::IdentityProvider;
use resonant_db::repositories::PgAccountStore;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonant_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = resonant_db::create_pool(&database_url, config.external_call_timeout())
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    resonant_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    resonant_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let accounts = Arc::new(PgAccountStore::new(pool, config.external_call_timeout()));

    let ingestor = Arc::new(
        BlobPublisher::new(config.blob.clone(), config.external_call_timeout())
            .expect("Failed to build blob publisher client"),
    );
    tracing::info!(publisher_url = %config.blob.publisher_url, "Blob publisher configured");

    let identity = Arc::new(JwtIdentityProvider::new(&config.identity));
    if !identity.is_ready() {
        tracing::warn!("IDENTITY_JWT_SECRET is not set; session-gated endpoints will answer 503");
    }

    let hasher = Arc::new(
        CredentialHasher::new(config.password_hash_cost)
            .expect("PASSWORD_HASH_COST must be a valid bcrypt cost (4-31)"),
    );

    let onboarding = Arc::new(OnboardingRegistry::new(config.registry_limits()));
    tokio::spawn(sweep_expired(Arc::clone(&onboarding), SWEEP_INTERVAL));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        accounts,
        ingestor,
        identity,
        hasher,
        onboarding,
    };

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

    let signalled = Arc::new(Notify::new());
    let trigger = Arc::clone(&signalled);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            trigger.notify_one();
        })
        .into_future();

    // In-flight requests get `SHUTDOWN_TIMEOUT_SECS` to finish.
    let drain_deadline = async {
        signalled.notified().await;
        tokio::time::sleep(config.shutdown_timeout()).await;
    };

    tokio::select! {
        result = server => result.expect("Server error"),
        () = drain_deadline => {
            tracing::warn!(
                timeout_secs = config.shutdown_timeout_secs,
                "Shutdown timeout elapsed with requests still in flight"
            );
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
