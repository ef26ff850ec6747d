//! overpass/src/types.rs
//! Shared type aliases and metrics counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Proxy-assigned connection identifier, used for log correlation.
pub type ConnId = u64;

/// Process-wide traffic counters.
#[derive(Default)]
pub struct ProxyMetrics {
    pub total_conn: AtomicU64,
    pub active_conn: AtomicU64,
    /// Bytes relayed client -> upstream.
    pub total_bytes_sent: AtomicU64,
    /// Bytes relayed upstream -> client (including synthesized replies).
    pub total_bytes_recv: AtomicU64,
}

impl ProxyMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_conn: self.total_conn.load(Ordering::SeqCst),
            active_conn: self.active_conn.load(Ordering::SeqCst),
            total_bytes_sent: self.total_bytes_sent.load(Ordering::SeqCst),
            total_bytes_recv: self.total_bytes_recv.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_conn: u64,
    pub active_conn: u64,
    pub total_bytes_sent: u64,
    pub total_bytes_recv: u64,
}
