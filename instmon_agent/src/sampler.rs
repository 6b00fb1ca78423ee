//! Background sampler: collects a sample on a fixed period and records it in the history.

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

use crate::metrics::collect_sample;
use crate::state::AppState;

/// Collect once and store the sample under the configured instance id.
pub async fn sample_once(state: &AppState) {
    let sample = collect_sample(state).await;
    let mut history = state.history.write().await;
    history.record(&state.instance_id, sample, Utc::now());
    debug!(
        instance = %state.instance_id,
        kept = history.len(&state.instance_id),
        "sample recorded"
    );
}

// First tick fires immediately so the API has data right after start.
pub fn spawn_sampler(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sample_once(&state).await;
        }
    })
}
