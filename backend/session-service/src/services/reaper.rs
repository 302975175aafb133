/// Background sweep of expired token records
///
/// Expired records are already treated as absent at lookup; the sweep only
/// keeps the table from growing.
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::db::TokenStore;
use crate::error::Result;

/// Delete every record expired as of `clock.now()`
pub async fn sweep_expired_tokens(store: &dyn TokenStore, clock: &dyn Clock) -> Result<u64> {
    let removed = store.delete_expired(clock.now()).await?;
    if removed > 0 {
        info!(removed, "Swept expired token records");
    } else {
        debug!("No expired token records to sweep");
    }
    Ok(removed)
}

/// Spawn the periodic sweep
///
/// A zero `every` disables the reaper and returns `None`. The first sweep
/// runs immediately. Failures are logged and the loop keeps going; callers
/// stop it by aborting the handle.
pub fn spawn_token_reaper(
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        info!("Token reaper disabled");
        return None;
    }

    info!(interval_secs = every.as_secs(), "Starting token reaper");

    Some(tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(err) = sweep_expired_tokens(store.as_ref(), clock.as_ref()).await {
                error!("Token reaper sweep failed: {}", err);
            }
        }
    }))
}
