mod app;
mod auth;
mod config;
mod db;
mod error;
mod inquiry;
mod pagination;
mod products;
mod profile;
mod response;
mod state;
mod storage;
mod upload;
mod users;

#[cfg(test)]
mod testing;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "storefront_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);
    let production = config.environment.is_production();
    let (app_state, db) = AppState::init(config).await?;

    if let Err(e) = db::migrate(&db).await {
        if production {
            return Err(e);
        }
        tracing::warn!(error = %e, "migrations failed; continuing");
    }

    let app = app::build_app(app_state);
    app::serve(app, &host, port).await
}
