//! overpass/src/listener.rs
//! Accept loop: pairs each inbound client with a session task and owns the
//! shutdown signal.

use crate::{
    config::ProxyConfig,
    connection,
    error::ProxyError,
    notify::Notifier,
    registry::SessionRegistry,
    types::ProxyMetrics,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};

pub struct Proxy {
    listener: TcpListener,
    config: Arc<ProxyConfig>,
    registry: Arc<SessionRegistry>,
    notifier: Notifier,
    metrics: Arc<ProxyMetrics>,
    conn_counter: AtomicU64,
}

impl Proxy {
    /// Binds the listen address. The upstream address is only dialed per
    /// accepted connection, inside the session task.
    pub async fn bind(
        config: ProxyConfig,
        registry: Arc<SessionRegistry>,
        notifier: Notifier,
    ) -> Result<Self, ProxyError> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        info!(listen = %config.listen_addr, upstream = %config.upstream_addr, "Proxy listening");
        Ok(Self {
            listener,
            config: Arc::new(config),
            registry,
            notifier,
            metrics: Arc::new(ProxyMetrics::default()),
            conn_counter: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    pub fn metrics(&self) -> Arc<ProxyMetrics> {
        self.metrics.clone()
    }

    /// Accepts connections until the shutdown signal flips. In-flight
    /// sessions are not cancelled; they drain on their own termination
    /// paths.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ProxyError> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((client, addr)) => {
                            let conn_id = self.conn_counter.fetch_add(1, Ordering::SeqCst);
                            self.metrics.total_conn.fetch_add(1, Ordering::SeqCst);
                            self.metrics.active_conn.fetch_add(1, Ordering::SeqCst);
                            info!(conn = conn_id, peer = %addr, "Accepted connection");
                            tokio::spawn(connection::handle_conn(
                                conn_id,
                                client,
                                self.config.clone(),
                                self.registry.clone(),
                                self.notifier.clone(),
                                self.metrics.clone(),
                            ));
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                            break;
                        }
                    }
                },
                _ = shutdown.changed() => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }
        Ok(())
    }
}
