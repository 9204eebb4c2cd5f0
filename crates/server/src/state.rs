//! Application state and rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use elix_core::MaintenanceService;
use elix_store::{JsonFileStore, MemoryStore, RecordStore};
use tokio::sync::Mutex;

use crate::config::{ConfigError, ServerConfig};
use crate::identity::{Identity, IdentityProvider, RemoteIdentityProvider, StaticTokenProvider};

/// Rate limit window duration in seconds (1 minute).
pub(crate) const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Per-IP request tracker: (request count, window start time).
type IpTracker = HashMap<IpAddr, (u64, Instant)>;

struct Tracker {
    clients: IpTracker,
    last_sweep: Instant,
}

/// In-memory fixed-window per-IP rate limiter.
pub struct RateLimiter {
    tracker: Mutex<Tracker>,
    /// Maximum requests per window. 0 means unlimited.
    max_requests: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u64) -> Self {
        Self {
            tracker: Mutex::new(Tracker {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            max_requests,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Check if a request from the given IP is allowed.
    /// Returns Ok(()) if allowed, Err(retry_after_secs) if rate limited.
    pub async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut tracker = self.tracker.lock().await;

        // Once per window, forget clients whose window has closed.
        if now.duration_since(tracker.last_sweep).as_secs() >= RATE_LIMIT_WINDOW_SECS {
            tracker.clients.retain(|_, (_, start)| {
                now.duration_since(*start).as_secs() < RATE_LIMIT_WINDOW_SECS
            });
            tracker.last_sweep = now;
        }

        let entry = tracker.clients.entry(ip).or_insert((0, now));

        let elapsed = now.duration_since(entry.1).as_secs();
        if elapsed >= RATE_LIMIT_WINDOW_SECS {
            entry.0 = 0;
            entry.1 = now;
        }

        entry.0 += 1;
        if entry.0 > self.max_requests {
            Err(RATE_LIMIT_WINDOW_SECS.saturating_sub(elapsed))
        } else {
            Ok(())
        }
    }

    /// Number of client IPs currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.tracker.lock().await.clients.len()
    }
}

/// Application state shared across request handlers.
pub struct AppState {
    pub service: MaintenanceService,
    pub identity: Arc<dyn IdentityProvider>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        service: MaintenanceService,
        identity: Arc<dyn IdentityProvider>,
        rate_limit: u64,
    ) -> Self {
        AppState {
            service,
            identity,
            rate_limiter: RateLimiter::new(rate_limit),
        }
    }

    /// Build the store, identity provider and service `config` describes.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let store: Arc<dyn RecordStore> = match &config.store_path {
            Some(path) => {
                let store = JsonFileStore::open(path)
                    .await
                    .map_err(|e| ConfigError::Invalid(format!("could not open store: {e}")))?;
                Arc::new(store)
            }
            None => Arc::new(MemoryStore::new()),
        };

        let identity: Arc<dyn IdentityProvider> = match &config.identity {
            Some(remote) => Arc::new(RemoteIdentityProvider::new(&remote.url, &remote.key)),
            None => {
                let mut provider = StaticTokenProvider::new();
                if let Some(token) = &config.api_token {
                    provider = provider.with_token(
                        token.clone(),
                        Identity {
                            id: "api-token".into(),
                            email: None,
                        },
                    );
                }
                Arc::new(provider)
            }
        };

        tracing::info!(
            store = store.backend_name(),
            identity = identity.provider_name(),
            rate_limit = config.rate_limit,
            "application state ready"
        );

        let service = MaintenanceService::new(store).with_settings(config.kpi);
        Ok(AppState::new(service, identity, config.rate_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    #[tokio::test]
    async fn limiter_rejects_after_quota() {
        let limiter = RateLimiter::new(2);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.check(ip).await.is_ok());
        assert!(limiter.check(ip).await.is_ok());
        let retry = limiter.check(ip).await.unwrap_err();
        assert!(retry <= RATE_LIMIT_WINDOW_SECS);

        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert!(limiter.check(other).await.is_ok());
    }

    #[tokio::test]
    async fn expired_clients_are_swept() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for last in 1..=50u8 {
            let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, last));
            assert!(limiter.check_at(ip, start).await.is_ok());
        }
        assert_eq!(limiter.tracked_clients().await, 50);

        let later = start + Duration::from_secs(RATE_LIMIT_WINDOW_SECS + 1);
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
        assert!(limiter.check_at(ip, later).await.is_ok());
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn active_clients_survive_a_sweep() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();
        let busy = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let idle = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert!(limiter.check_at(idle, start).await.is_ok());

        let mid = start + Duration::from_secs(RATE_LIMIT_WINDOW_SECS - 1);
        assert!(limiter.check_at(busy, mid).await.is_ok());

        let later = start + Duration::from_secs(RATE_LIMIT_WINDOW_SECS + 1);
        assert!(limiter.check_at(busy, later).await.is_err());
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn zero_disables_limiting() {
        let limiter = RateLimiter::new(0);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        for _ in 0..1_000 {
            assert!(limiter.check(ip).await.is_ok());
        }
    }

    #[tokio::test]
    async fn config_token_is_accepted() {
        let config = ServerConfig {
            api_token: Some("dev-token".into()),
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.identity.verify("dev-token").await.unwrap().id, "api-token");
        assert!(state.identity.verify("nope").await.is_err());
    }

    #[tokio::test]
    async fn file_store_is_opened() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            store_path: Some(dir.path().join("elix.json")),
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.service.repository().store().backend_name(), "json-file");
    }
}
