mod bootstrap;
mod routes;
mod service;

use std::sync::Arc;

use anyhow::Result;
use taskhub_core::config::{AppConfig, LoadOptions};
use taskhub_db::repositories::SqlTaskRepository;
use taskhub_slack::api::SlackApiClient;
use taskhub_slack::commands::CommandRouter;
use taskhub_slack::signing::RequestAuthenticator;

use crate::routes::AppState;
use crate::service::StoreTaskService;

fn init_logging(config: &AppConfig) {
    use taskhub_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let authenticator =
        RequestAuthenticator::new(app.config.slack.signing_secret.clone());
    let notifier = app.config.slack.bot_token.clone().map(SlackApiClient::new);
    let commands = Arc::new(CommandRouter::new(StoreTaskService::new(SqlTaskRepository::new(
        app.db_pool.clone(),
    ))));

    let state = AppState {
        commands,
        authenticator,
        notifier,
        db_pool: app.db_pool.clone(),
    };

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "taskhub-server listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "taskhub-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
