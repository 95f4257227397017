use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tradebook_server::config::Config;
use tradebook_server::create_app;
use tradebook_sheets::GoogleSheetsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = "debug";
    #[cfg(not(debug_assertions))]
    let log_level = "info";

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting trading server...");

    let config = Config::from_env().context("loading configuration")?;
    tracing::info!(
        "Configuration: port={}, production={}, spreadsheet={}, users={}, units={}, trades={}, timeout={}s",
        config.port,
        config.production,
        config.spreadsheet_id,
        config.users_range,
        config.units_range,
        config.trades_range,
        config.request_timeout.as_secs()
    );

    let client = GoogleSheetsClient::new(
        &config.sheets_base_url,
        config.access_token.clone(),
        config.request_timeout,
    )
    .context("creating sheets client")?;
    let app = create_app(Arc::new(client), &config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;
    Ok(())
}
