use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use parkade_api::{app, auth, bootstrap, state::{AppState, AuthConfig, RateLimit}};
use parkade_store::app_config::Config;
use parkade_store::RedisClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkade_api=debug,parkade_allocation=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Parkade API on port {}", config.server.port);

    let (slots, tickets, admins) = bootstrap::repositories(&config).await?;

    if let Some(creds) = &config.auth.bootstrap_admin {
        auth::ensure_admin(admins.as_ref(), creds).await?;
    }

    let rate_limit = match &config.redis {
        Some(redis) if config.rate_limit.enabled => {
            let client = RedisClient::new(&redis.url)
                .await
                .context("Failed to connect to Redis")?;
            Some(RateLimit {
                redis: Arc::new(client),
                requests: config.rate_limit.requests,
                window_seconds: config.rate_limit.window_seconds,
            })
        }
        _ => {
            tracing::info!("Rate limiting disabled");
            None
        }
    };

    let engine = bootstrap::engine(&config, slots, tickets);

    let app_state = AppState {
        engine,
        admins,
        rate_limit,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}
