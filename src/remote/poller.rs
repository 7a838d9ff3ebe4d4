//! Remote poll loop
//!
//! Fetches the configured URL on a fixed period and hands each `(status,
//! body)` pair to the processor. Skips cycles while the link is down or no
//! URL is configured; fetch errors cost one cycle and nothing else.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::net::NetLink;
use crate::remote::RemoteProcessor;
use crate::settings::Settings;
use crate::transport::HttpFetch;

/// Poll the configured URL forever
pub async fn poll_remote(
    fetch: Arc<dyn HttpFetch>,
    processor: RemoteProcessor,
    settings: Settings,
    link: Arc<dyn NetLink>,
    period: Duration,
) {
    let mut ticker = interval(period);
    // Consume the immediate tick so the first fetch happens one period in,
    // giving the link time to come up after boot.
    ticker.tick().await;

    info!(period_ms = period.as_millis() as u64, "remote poller started");
    loop {
        ticker.tick().await;

        if !link.is_connected() {
            debug!("link down, skipping poll");
            continue;
        }
        let Some(url) = settings.url().filter(|url| !url.is_empty()) else {
            debug!("remote URL not set, skipping poll");
            continue;
        };

        match fetch.get(&url).await {
            Ok((status, body)) => processor.apply(status, &body, &url).await,
            Err(e) => warn!(url = %url, error = %e, "poll fetch failed"),
        }
    }
}
