//! Periodic reclamation of pending registrations nobody came back for.
use std::sync::Arc;
use std::time::Duration;

use crate::otp_cache::OtpCache;

/// Purges expired entries every `interval`. With no interval the task idles
/// forever, so eviction stays lazy and the caller's `select!` is undisturbed.
pub async fn run_sweeper_until_stopped<T>(
    cache: Arc<OtpCache<T>>,
    interval: Option<Duration>,
) -> Result<(), anyhow::Error> {
    let interval = match interval {
        Some(interval) => interval,
        None => {
            tracing::info!("Passcode sweeper disabled");
            std::future::pending::<()>().await;
            return Ok(());
        }
    };

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        sweep(&cache);
    }
}

#[tracing::instrument(skip_all, fields(purged = tracing::field::Empty))]
fn sweep<T>(cache: &OtpCache<T>) -> usize {
    let purged = cache.purge_expired();
    tracing::Span::current().record("purged", &purged);
    if purged > 0 {
        tracing::info!(remaining = cache.len(), "Purged expired registrations");
    }
    purged
}
