use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};

use crate::cache::TaggedCache;

/// Drops expired cache entries every `every` until the runtime stops.
pub async fn start_cache_sweep_task(cache: Arc<TaggedCache>, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let purged = cache.purge_expired();
        if purged > 0 {
            tracing::debug!("Purged {} expired cache entries", purged);
        }
    }
}
