use std::path::PathBuf;

use crate::limits::DEFAULT_STAGE_TTL_MS;
use crate::model::Ms;

/// Runtime configuration, read from `INNKEEP_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the WAL and the audit log.
    pub data_dir: PathBuf,
    /// Idle lifetime of a staged stay.
    pub stage_ttl_ms: Ms,
    /// Prometheus exporter port. None disables the exporter.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            stage_ttl_ms: DEFAULT_STAGE_TTL_MS,
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("INNKEEP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let stage_ttl_ms = std::env::var("INNKEEP_STAGE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<Ms>().ok())
            .map(|secs| secs * 1000)
            .unwrap_or(DEFAULT_STAGE_TTL_MS);
        let metrics_port = std::env::var("INNKEEP_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok());
        Self {
            data_dir,
            stage_ttl_ms,
            metrics_port,
        }
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("innkeep.wal")
    }

    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join("audit.log")
    }
}
