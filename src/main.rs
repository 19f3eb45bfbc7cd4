//! Accept-Language Store Redirect Gateway
//!
//! Sits in front of a multi-store shop and sends visitors who land on the
//! bare site root to the sibling store matching their browser language.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ request id ─▶ trace ─▶ timeout             │
//!                              │                    │                         │
//!                              │                    ▼                         │
//!                              │         ┌─────────────────────┐              │
//!                              │         │ locale redirect     │── 302 ───────┼──▶ Client
//!                              │         │ (resolve + rule)    │              │
//!                              │         └─────────┬───────────┘              │
//!                              │                   │ pass                     │
//!                              │                   ▼                          │
//!                              │         ┌─────────────────────┐              │
//!                              │         │ forward handler     │──────────────┼──▶ Upstream
//!                              │         └─────────────────────┘              │
//!                              │                                              │
//!                              │  config (TOML, hot reload) · observability   │
//!                              │  lifecycle (signals, graceful shutdown)      │
//!                              └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use locale_redirect::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use locale_redirect::http::{HttpServer, RequestContext};
use locale_redirect::lifecycle::{signals::spawn_signal_handler, Shutdown};
use locale_redirect::observability::{logging::init_logging, metrics::init_metrics};
use locale_redirect::routing::ConfiguredRule;
use locale_redirect::store::resolve_store_code;

#[derive(Parser)]
#[command(name = "locale-redirect")]
#[command(version, about = "Accept-Language store redirect gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway
    Serve {
        /// Path to the TOML configuration (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reload the configuration when the file changes
        #[arg(long, requires = "config")]
        watch: bool,
    },
    /// Evaluate the redirect rule for one simulated request
    Check {
        #[arg(short, long)]
        config: PathBuf,

        /// Run code the request targets
        #[arg(long)]
        run_code: String,

        /// Accept-Language header value
        #[arg(long)]
        accept_language: Option<String>,

        /// Request target
        #[arg(long, default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, watch } => serve(config, watch).await,
        Commands::Check {
            config,
            run_code,
            accept_language,
            path,
        } => check(config, run_code, accept_language, path),
    }
}

async fn serve(path: Option<PathBuf>, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("locale-redirect v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        stores = config.stores.len(),
        upstream = ?config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (config_updates, _watcher) = match path.filter(|_| watch) {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config);
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn check(
    path: PathBuf,
    run_code: String,
    accept_language: Option<String>,
    target: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&path)?;
    init_logging(&config.observability);

    let mut headers = HeaderMap::new();
    if let Some(value) = accept_language {
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&value)?);
    }
    let ctx = RequestContext::new(target, Some(run_code), headers);

    let rule = ConfiguredRule::from_config(&config);
    let resolved = resolve_store_code(ctx.target(), ctx.run_code(), rule.stores(), &config.routing);

    match rule.evaluate(resolved.as_deref(), &ctx) {
        Some(decision) => println!("{}", serde_json::to_string_pretty(&decision)?),
        None => println!("no redirect"),
    }
    Ok(())
}
