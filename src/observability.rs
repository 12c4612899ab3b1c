use std::net::SocketAddr;

// ── Booking-flow metrics ────────────────────────────────────────

/// Counter: stays staged for checkout.
pub const STAYS_STAGED_TOTAL: &str = "innkeep_stays_staged_total";

/// Counter: reservations confirmed.
pub const RESERVATIONS_CONFIRMED_TOTAL: &str = "innkeep_reservations_confirmed_total";

/// Counter: confirms rejected because the room was taken.
pub const CONFIRM_CONFLICTS_TOTAL: &str = "innkeep_confirm_conflicts_total";

/// Counter: reservations cancelled.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "innkeep_reservations_cancelled_total";

/// Counter: staged stays dropped by the expiry sweeper.
pub const STAGES_EXPIRED_TOTAL: &str = "innkeep_stages_expired_total";

/// Counter: audit entries dropped (channel full or writer gone).
pub const AUDIT_DROPPED_TOTAL: &str = "innkeep_audit_dropped_total";

// ── Durability metrics ──────────────────────────────────────────

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "innkeep_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "innkeep_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
