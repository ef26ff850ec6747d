//! overpass/src/connection.rs
//! Per-session workflow: dial upstream, handshake, bidirectional relay.

use crate::{
    commands::{self, Outcome},
    config::ProxyConfig,
    notify::{Notifier, SessionEvent},
    protocol::{self, Frame},
    registry::SessionRegistry,
    types::{ConnId, ProxyMetrics},
};
use std::{
    io::{Error, ErrorKind},
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::sleep,
};
use tracing::{debug, error, info, warn};

const RELAY_BUF_SIZE: usize = 4096;

/// Main session workflow. Owns both sockets for the session's lifetime and
/// decrements the active-connection counter exactly once on exit.
pub async fn handle_conn(
    conn_id: ConnId,
    client: TcpStream,
    config: Arc<ProxyConfig>,
    registry: Arc<SessionRegistry>,
    notifier: Notifier,
    metrics: Arc<ProxyMetrics>,
) {
    run_session(conn_id, client, config, &registry, &notifier, &metrics).await;
    metrics.active_conn.fetch_sub(1, Ordering::SeqCst);
}

async fn run_session(
    conn_id: ConnId,
    mut client: TcpStream,
    config: Arc<ProxyConfig>,
    registry: &SessionRegistry,
    notifier: &Notifier,
    metrics: &ProxyMetrics,
) {
    // Identity is the client's remote address, unique per live connection.
    let identity = client
        .peer_addr()
        .map_or_else(|_| format!("conn-{conn_id}"), |addr| addr.to_string());

    let mut upstream = match TcpStream::connect(&config.upstream_addr).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(conn = conn_id, upstream = %config.upstream_addr, "Failed to connect upstream: {}", e);
            return;
        }
    };

    let username = match handshake(&mut client, &mut upstream).await {
        Ok(username) => username,
        Err(e) => {
            error!(conn = conn_id, "Handshake failed: {}", e);
            return;
        }
    };

    info!(conn = conn_id, %identity, %username, "Session active");
    registry.insert(identity.clone(), username.clone());
    notifier.send(SessionEvent::Joined {
        username: username.clone(),
    });

    match relay(
        conn_id,
        &mut client,
        &mut upstream,
        registry,
        metrics,
        config.idle_timeout(),
    )
    .await
    {
        Ok((sent, received)) => {
            info!(conn = conn_id, sent, received, "Relay finished");
        }
        Err(e) => error!(conn = conn_id, "Relay failed: {}", e),
    }

    // Shut down both endpoints before unregistering so a read still pending
    // on either socket unblocks instead of waiting on a flag it cannot
    // observe.
    let _ = client.shutdown().await;
    let _ = upstream.shutdown().await;
    registry.remove(&identity);
    notifier.send(SessionEvent::Left { username });
    info!(conn = conn_id, %identity, "Session closed");
}

/// The fixed two-message exchange at session start: the client's connection
/// request goes upstream verbatim, the server's accept comes back verbatim,
/// and the proxy learns the username in passing.
async fn handshake(client: &mut TcpStream, upstream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = [0u8; RELAY_BUF_SIZE];

    let n = client.read(&mut buf).await?;
    if n == 0 {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            "client closed before connection request",
        ));
    }
    let username = match protocol::classify(&buf[..n]) {
        Frame::Handshake { username } => {
            let name = String::from_utf8_lossy(username).into_owned();
            if name.is_empty() {
                "undefined".to_string()
            } else {
                name
            }
        }
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "first message is not a connection request",
            ));
        }
    };
    upstream.write_all(&buf[..n]).await?;

    let n = upstream.read(&mut buf).await?;
    if n == 0 {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            "upstream closed during handshake",
        ));
    }
    client.write_all(&buf[..n]).await?;

    Ok(username)
}

/// What the sniffer decided about a client-to-server buffer.
enum Sniffed {
    Forward,
    Reply(Vec<u8>),
}

/// Bidirectional copy with message sniffing on every buffer. Each read is
/// treated as one logical protocol message; order within a direction is
/// preserved, the two directions are independent.
///
/// A zero-length read in either direction ends the session as a whole; the
/// caller then shuts down both endpoints, so a read pending on the other
/// socket is interrupted instead of lingering half-open. Any read/write
/// error ends the session the same way peer closure does.
async fn relay(
    conn_id: ConnId,
    client: &mut TcpStream,
    upstream: &mut TcpStream,
    registry: &SessionRegistry,
    metrics: &ProxyMetrics,
    idle_timeout: Option<Duration>,
) -> std::io::Result<(u64, u64)> {
    let mut sent = 0u64;
    let mut received = 0u64;
    let mut c_buf = [0u8; RELAY_BUF_SIZE];
    let mut s_buf = [0u8; RELAY_BUF_SIZE];
    let (idle_enabled, idle) = match idle_timeout {
        Some(d) => (true, d),
        None => (false, Duration::ZERO),
    };

    loop {
        tokio::select! {
            biased;

            result = client.read(&mut c_buf) => {
                let n = result?;
                if n == 0 {
                    debug!(conn = conn_id, "Client closed");
                    break;
                }
                match sniff_client(conn_id, &c_buf[..n], registry) {
                    Sniffed::Forward => {
                        upstream.write_all(&c_buf[..n]).await?;
                        sent += n as u64;
                        metrics.total_bytes_sent.fetch_add(n as u64, Ordering::SeqCst);
                    }
                    Sniffed::Reply(frame) => {
                        client.write_all(&frame).await?;
                        received += frame.len() as u64;
                        metrics.total_bytes_recv.fetch_add(frame.len() as u64, Ordering::SeqCst);
                    }
                }
            },
            result = upstream.read(&mut s_buf) => {
                let n = result?;
                if n == 0 {
                    debug!(conn = conn_id, "Upstream closed");
                    break;
                }
                sniff_upstream(conn_id, &s_buf[..n]);
                client.write_all(&s_buf[..n]).await?;
                received += n as u64;
                metrics.total_bytes_recv.fetch_add(n as u64, Ordering::SeqCst);
            },
            // The timer is recreated every iteration, so it only fires after
            // a full window with no traffic in either direction.
            _ = sleep(idle), if idle_enabled => {
                warn!(conn = conn_id, "Idle timeout, closing session");
                break;
            },
        }
    }

    Ok((sent, received))
}

/// Client-to-server sniffing: plain chat is logged and forwarded, slash
/// commands are resolved against the registry and may be answered by the
/// proxy without ever reaching the upstream server.
fn sniff_client(conn_id: ConnId, buf: &[u8], registry: &SessionRegistry) -> Sniffed {
    if let Frame::Chat { text } = protocol::classify(buf) {
        match protocol::command_name(text) {
            Some(name) => {
                let name = String::from_utf8_lossy(name);
                match commands::resolve(&name, registry) {
                    Outcome::Reply(frame) => {
                        info!(conn = conn_id, command = %name, "Intercepted command");
                        return Sniffed::Reply(frame);
                    }
                    Outcome::Passthrough => {
                        debug!(conn = conn_id, command = %name, "Unrecognized command passed through");
                    }
                }
            }
            None => {
                debug!(conn = conn_id, chat = %String::from_utf8_lossy(text), "Chat");
            }
        }
    }
    Sniffed::Forward
}

/// Server-to-client buffers are never rewritten; chat is only logged.
fn sniff_upstream(conn_id: ConnId, buf: &[u8]) {
    if let Frame::Chat { text } = protocol::classify(buf) {
        debug!(conn = conn_id, chat = %String::from_utf8_lossy(text), "Chat from server");
    }
}
