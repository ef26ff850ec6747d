//! overpass/src/main.rs
//! CLI entry point.

use clap::Parser;
use overpass::{config::ProxyConfig, listener::Proxy, logging, notify, registry::SessionRegistry};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "overpass", about = "Transparent game-protocol passthrough proxy")]
struct Args {
    /// Path to a JSON configuration file.
    #[arg(long, env = "OVERPASS_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration file.
    #[arg(long)]
    listen: Option<String>,

    /// Upstream server address, overriding the configuration file.
    #[arg(long)]
    upstream: Option<String>,

    /// Webhook URL notified on player join/leave.
    #[arg(long, env = "OVERPASS_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Default log filter (tracing EnvFilter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_logging(&args.log);

    let mut config = match ProxyConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(upstream) = args.upstream {
        config.upstream_addr = upstream;
    }
    if let Some(url) = args.webhook_url {
        config.webhook_url = Some(url);
    }

    let (notifier, _forwarder) = notify::spawn_forwarder(config.webhook_url.clone());
    let registry = Arc::new(SessionRegistry::new());
    let proxy = match Proxy::bind(config, registry, notifier).await {
        Ok(proxy) => proxy,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let metrics = proxy.metrics();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(e) = proxy.run(shutdown_rx).await {
        error!("Proxy failed: {}", e);
        std::process::exit(1);
    }

    if let Ok(json) = serde_json::to_string(&metrics.snapshot()) {
        info!(metrics = %json, "Final metrics");
    }
}
