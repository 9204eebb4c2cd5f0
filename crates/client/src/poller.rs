//! Fixed-interval realtime polling.

use std::sync::Arc;
use std::time::Duration;

use elix_core::realtime::RealtimeFeed;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::DashboardClient;

/// Polls `GET /demo/realtime-updates` on a fixed interval.
///
/// Every tick spawns its own request, so a slow response never delays the
/// next one and overlapping requests are possible. Failed requests fall back
/// to locally simulated updates. There is no backoff.
pub struct RealtimePoller {
    client: Arc<DashboardClient>,
    interval: Duration,
}

impl RealtimePoller {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

    pub fn new(client: Arc<DashboardClient>) -> Self {
        RealtimePoller {
            client,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Set the tick period. Zero is raised to one millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling, handing every feed to `on_update`. The first request
    /// goes out immediately.
    pub fn spawn<F>(self, on_update: F) -> PollerHandle
    where
        F: Fn(RealtimeFeed) + Send + Sync + 'static,
    {
        let on_update = Arc::new(on_update);
        let RealtimePoller { client, interval } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let client = Arc::clone(&client);
                let on_update = Arc::clone(&on_update);
                tokio::spawn(async move {
                    let feed = client.realtime_updates_or_demo().await;
                    on_update(feed);
                });
            }
        });
        tracing::debug!(interval_ms = interval.as_millis() as u64, "realtime poller started");
        PollerHandle { task }
    }

    /// Start polling and receive feeds on a channel.
    pub fn subscribe(self) -> (PollerHandle, mpsc::UnboundedReceiver<RealtimeFeed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.spawn(move |feed| {
            if tx.send(feed).is_err() {
                tracing::debug!("realtime receiver dropped");
            }
        });
        (handle, rx)
    }
}

/// Stops the poller when [`PollerHandle::stop`] is called or the handle is
/// dropped. Requests already in flight still complete.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
