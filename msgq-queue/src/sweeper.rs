//! Background removal of expired messages

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::storage::MessageStore;

/// Spawn a task that purges expired messages every `every`.
///
/// The task runs until the returned handle is aborted.
pub fn spawn_sweeper(store: Arc<dyn MessageStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        info!(interval_secs = every.as_secs(), "Expiry sweeper started");

        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Swept expired messages"),
                Err(e) => warn!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}
