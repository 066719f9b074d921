//! AnkiConnect ⇄ asbplayer bridge.
//!
//! Sits in front of AnkiConnect and relays its HTTP API, while keeping
//! WebSocket connections to asbplayer clients so note creation and player
//! control can be routed through them.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │                    BRIDGE                     │
//!    HTTP caller        │  ┌─────────┐   ┌────────────┐   ┌──────────┐  │
//!    ───────────────────┼─▶│  http   │──▶│ anki /     │──▶│ upstream │──┼──▶ AnkiConnect
//!                       │  │ server  │   │ asbplayer  │   │ forward  │  │
//!                       │  └─────────┘   └─────┬──────┘   └──────────┘  │
//!                       │                      │ Command                 │
//!                       │                      ▼                         │
//!                       │  ┌─────────────────────────────────────────┐   │
//!                       │  │ bridge: correlation → publisher         │   │
//!                       │  │         registry    ← collector         │   │
//!                       │  └──────────────┬──────────────▲───────────┘   │
//!                       │                 │ broadcast    │ Reply         │
//!                       └─────────────────┼──────────────┼───────────────┘
//!                                         ▼              │
//!                                  asbplayer clients (WebSocket /ws)
//! ```

use std::path::PathBuf;

use clap::Parser;

use anki_bridge::config;
use anki_bridge::lifecycle::Shutdown;
use anki_bridge::net;
use anki_bridge::observability::{logging, metrics};
use anki_bridge::HttpServer;

#[derive(Parser)]
#[command(name = "anki-bridge")]
#[command(about = "Forward AnkiConnect requests through connected asbplayer clients", long_about = None)]
struct Args {
    /// Optional TOML config file; PORT, ANKI_CONNECT_URL and POST_MINE_ACTION override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load(args.config.as_deref())?;

    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        anki_connect_url = %config.upstream.url,
        post_mine_action = u8::from(config.mining.post_mine_action),
        reply_timeout_ms = config.correlation.reply_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = net::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
