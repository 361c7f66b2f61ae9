//! Logging and metrics setup

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

pub const RESULTS_CREATED: &str = "gradebook_results_created_total";
pub const RESULTS_DELETED: &str = "gradebook_results_deleted_total";
pub const RESULTS_CLEARED: &str = "gradebook_results_cleared_total";
pub const DELETE_NOT_FOUND: &str = "gradebook_delete_not_found_total";
pub const VERIFICATION_REJECTED: &str = "gradebook_verification_rejected_total";
pub const RECORDS: &str = "gradebook_records";

/// Initialize logging
pub fn init_logging(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

/// Install the Prometheus recorder. Returns `None` if disabled or if a
/// recorder is already installed.
pub fn init_metrics(config: &ServerConfig) -> Option<PrometheusHandle> {
    if !config.metrics_enabled {
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics exporter installed");
            Some(handle)
        }
        Err(e) => {
            warn!("Metrics disabled: {e}");
            None
        }
    }
}
