//! Audit recording: a bounded, best-effort sink fed by the S13 Handler and
//! the HTTP façade after every decision. Enqueue failures are logged, never
//! propagated — a full audit channel must not turn into a dropped call.

use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::colour::Colour;

/// Which external interface produced the checked equipment identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSource {
    Diameter,
    Http,
}

/// One record per completed check, independent of whether it succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub imei: String,
    pub status: Option<Colour>,
    pub check_time: DateTime<Utc>,
    pub origin: String,
    pub session_id: Option<String>,
    pub request_source: RequestSource,
    pub result_code: Option<u32>,
}

/// Anything that can accept completed audit records. `InProcessAuditSink` is
/// the only implementation this crate ships; a future deployment could swap
/// in one that forwards to a message bus without touching call sites.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// A bounded mpsc channel in front of audit recording. `record` never
/// blocks: when the channel is full the record is dropped and a warning is
/// logged, matching the "never propagate" rule above.
pub struct InProcessAuditSink {
    tx: mpsc::Sender<AuditRecord>,
}

impl InProcessAuditSink {
    /// Create a sink and its paired receiver. The caller is expected to
    /// drain the receiver (e.g. to a log file or downstream collector).
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<AuditRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl AuditSink for InProcessAuditSink {
    fn record(&self, record: AuditRecord) {
        if let Err(err) = self.tx.try_send(record) {
            warn!("audit record dropped: {err}");
        }
    }
}
