use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::model::now_ms;
use crate::observability;
use crate::stage::StageStore;

/// Background task that periodically drops staged stays that sat idle past
/// their lifetime.
pub async fn run_stage_sweeper(store: Arc<StageStore>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let expired = store.collect_expired(now_ms());
        for session in expired {
            // The session may have restaged or confirmed since collection
            if store.clear(&session) {
                metrics::counter!(observability::STAGES_EXPIRED_TOTAL).increment(1);
                info!("swept expired stage for session {session}");
            }
        }
    }
}
