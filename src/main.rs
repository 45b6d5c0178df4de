use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use snmp_ifpoll::config::AppConfig;
use snmp_ifpoll::handlers::AppState;
use snmp_ifpoll::routes::create_router;
use snmp_ifpoll::{InterfacePoller, JsonFormatter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load_or_default(AppConfig::config_path())?;
    config.debug_config();

    let poller = Arc::new(InterfacePoller::v2c(config.settings.polling.clone()));

    match std::env::args().nth(1).as_deref() {
        Some("serve") => serve(&config, poller).await,
        Some(other) => anyhow::bail!("unknown command `{}` (expected `serve` or nothing)", other),
        None => poll_once(&config, &poller).await,
    }
}

/// Polls the configured target once and prints the report.
async fn poll_once(config: &AppConfig, poller: &InterfacePoller) -> Result<()> {
    let target = config.get_target();
    let result = poller.fetch_interface_data(&target).await;
    let failure = result.as_ref().err().cloned();

    let report = JsonFormatter::format_result(&target, result);
    println!("{}", JsonFormatter::to_json_string(&report)?);

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn serve(config: &AppConfig, poller: Arc<InterfacePoller>) -> Result<()> {
    let state = AppState {
        poller,
        defaults: config.get_target(),
        request_timeout: config.request_timeout(),
    };
    let listen = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;

    info!(listen = %listen, "HTTP server started");
    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")
}
