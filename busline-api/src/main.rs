use anyhow::Context;
use busline_api::{app, state::{AppState, AuthConfig}};
use busline_core::SeatLedger;
use busline_store::{app_config::Config, DbClient, PostgresLedgerStore, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busline_api=debug,busline_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Busline API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let store = Arc::new(PostgresLedgerStore::new(db.pool.clone()));
    let ledger = SeatLedger::with_max_attempts(store, config.ledger.max_attempts);

    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url).context("Invalid Redis URL")?,
        )),
        None => {
            tracing::info!("Redis not configured, rate limiting disabled");
            None
        }
    };

    let app_state = AppState {
        ledger,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        rate_limit: config.rate_limit.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
