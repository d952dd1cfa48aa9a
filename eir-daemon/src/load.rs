//! The system-load snapshot every decision call takes. No metrics exporter
//! is in scope (Non-goals), so this is the minimal signal the rest of the
//! crate actually needs: how many Diameter peers are connected relative to
//! `MAX_CONNECTIONS`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use eir_core::SystemLoad;

#[derive(Clone)]
pub struct LoadMonitor {
    active: Arc<AtomicUsize>,
    max_connections: usize,
}

/// RAII guard decrementing the active-connection count on drop.
pub struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LoadMonitor {
    pub fn new(max_connections: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max_connections,
        }
    }

    /// Record one more connected peer; drop the guard on disconnect.
    pub fn accept(&self) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active: self.active.clone(),
        }
    }

    pub fn snapshot(&self) -> SystemLoad {
        let active = self.active.load(Ordering::SeqCst);
        SystemLoad {
            overload_level: 0,
            tps_overload: active >= self.max_connections,
        }
    }
}
