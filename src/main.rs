use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use profile_lens::{
    config::Config,
    db::{Database, PoolLifecycle},
    jwt::JwtKeys,
    llm::AiGateway,
    routes::create_router,
    AppState,
};

const DEFAULT_LOG_FILTER: &str = "profile_lens=debug,tower_http=debug,axum=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first; the runtime mode decides the log format
    let config = Config::from_env()?;

    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.mode.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }

    info!(mode = %config.mode, "Configuration loaded: {:?}", config.server);

    // Connection pool: created once, connects on first use
    let lifecycle = Arc::new(PoolLifecycle::new(config.mode));
    let db = Database::connect_lazy(&config.database, lifecycle)?;
    match db.health_check().await {
        Ok(()) => info!("Database reachable"),
        Err(e) => warn!(error = %e, "Database not reachable at startup"),
    }
    let monitor = db.spawn_monitor(&config.database);

    let ai = AiGateway::from_config(&config.ai)?;
    info!(provider = %config.ai.provider, model = %ai.default_model(), "AI gateway ready");

    let state = AppState {
        db: db.clone(),
        ai,
        jwt: Arc::new(JwtKeys::new(&config.auth.jwt_secret)),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down, closing database pool");
    monitor.abort();
    db.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
