use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Snapshot of stream activity, reported by `/health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    pub frames_sent: u64,
    pub send_failures: u64,
    pub bytes_sent: u64,
    pub active_clients: u32,
    pub total_clients: u64,
}

/// Live counters shared between the output sink and the HTTP handlers
#[derive(Debug, Default)]
pub struct StreamCounters {
    frames_sent: AtomicU64,
    send_failures: AtomicU64,
    bytes_sent: AtomicU64,
    active_clients: AtomicU32,
    total_clients: AtomicU64,
}

impl StreamCounters {
    pub fn record_frame(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_connected(&self) {
        self.active_clients.fetch_add(1, Ordering::Relaxed);
        self.total_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_disconnected(&self) {
        self.active_clients.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamStats {
        StreamStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            active_clients: self.active_clients.load(Ordering::Relaxed),
            total_clients: self.total_clients.load(Ordering::Relaxed),
        }
    }
}
