use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{CustomerId, Ms, StayRange, now_ms};
use crate::observability;

const CHANNEL_CAPACITY: usize = 1024;

/// One line in the audit trail, serialized as JSON.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuditEntry {
    pub customer_id: CustomerId,
    pub action: String,
    pub description: String,
    pub timestamp: Ms,
}

/// Best-effort audit trail. Entries are handed to a background writer over a
/// bounded channel; if the channel is full or the writer is gone, the entry
/// is dropped with a warning. A confirmed reservation never fails or blocks
/// because the audit write did.
pub struct AuditLog {
    tx: mpsc::Sender<AuditEntry>,
}

impl AuditLog {
    /// Open an audit log appending JSON lines to `path`. The writer task is
    /// spawned immediately; open failures are retried per entry.
    pub fn open(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(audit_writer_loop(path, rx));
        Self { tx }
    }

    /// Record a confirmed reservation. Fire-and-forget: never blocks, never
    /// surfaces an error to the caller.
    pub fn record(&self, customer_id: CustomerId, room_number: &str, range: &StayRange) {
        let entry = AuditEntry {
            customer_id,
            action: "Reservation Created".into(),
            description: format!(
                "Reservation for room {room_number} from {} to {}",
                range.check_in, range.check_out
            ),
            timestamp: now_ms(),
        };
        if let Err(e) = self.tx.try_send(entry) {
            metrics::counter!(observability::AUDIT_DROPPED_TOTAL).increment(1);
            warn!("audit entry dropped: {e}");
        }
    }
}

async fn audit_writer_loop(path: PathBuf, mut rx: mpsc::Receiver<AuditEntry>) {
    let mut file: Option<File> = None;
    while let Some(entry) = rx.recv().await {
        if file.is_none() {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(f) => file = Some(f),
                Err(e) => {
                    metrics::counter!(observability::AUDIT_DROPPED_TOTAL).increment(1);
                    warn!("audit log open failed ({}): {e}", path.display());
                    continue;
                }
            }
        }
        if let Some(f) = file.as_mut()
            && let Err(e) = write_entry(f, &entry) {
                metrics::counter!(observability::AUDIT_DROPPED_TOTAL).increment(1);
                warn!("audit write failed: {e}");
                // Drop the handle so the next entry reopens the file
                file = None;
            }
    }
}

fn write_entry(file: &mut File, entry: &AuditEntry) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');
    file.write_all(&line)?;
    file.flush()
}
