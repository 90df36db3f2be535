use std::{net::SocketAddr, str::FromStr};

use axum::{
    Router,
    routing::{get, post},
};
use helpdesk_licenses::{
    config::LookupConfig,
    handlers::{health::health_handler, helpscout::helpscout_handler},
    state::AppState,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:shop.db".to_string());
    let bind_addr = std::env::var("HELPDESK_BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3002".to_string());

    let config = LookupConfig::from_env()?;

    // The shop owns this database; we only ever read it.
    let options = SqliteConnectOptions::from_str(&database_url)?.read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let state = AppState::new(pool, config)?;

    let app = Router::new()
        .route("/helpscout", post(helpscout_handler))
        .route("/healthz", get(health_handler))
        .with_state(state);

    let addr: SocketAddr = bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
