//! Mirror relay service binary.
//!
//! Standalone HTTP service receiving monday.com webhooks.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mirror_relay::{server, Config, MondayClient};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting mirror relay v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        api_url = %config.api_url,
        api_version = %config.api_version,
        timeout_secs = config.request_timeout.as_secs(),
        "Configuration loaded"
    );

    let client = MondayClient::new(&config).context("Failed to create monday.com client")?;

    let addr = format!("0.0.0.0:{}", config.port);
    let state = server::AppState::new(config, client);

    server::run_server(state, &addr).await.context("Server error")
}

/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,mirror_relay=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
