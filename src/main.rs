use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walking_witness_gate::{
    AppState,
    config::AppConfig,
    create_router,
};

/// main
///
/// Loads configuration, initialises logging for the environment, and serves
/// the gated router until the process is stopped.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Environment Loading
    dotenv::dotenv().ok();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise gate decisions at debug and access logs at info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "walking_witness_gate=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    // Set up before the config loads so its warnings and errors are captured.
    // Pretty output locally, JSON in production.
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    // 4. Configuration (fail-fast on unsafe production settings)
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Gate starting in {:?} mode", config.env);
    if config.dev_bypass_enabled() {
        tracing::warn!("INSECURE_DEV_AUTH is on: the development sentinel token grants admin");
    }

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::from_config(config));

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %bind_addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API documentation available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server terminated");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
