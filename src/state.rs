use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::middleware::rate_limit::RateLimiter;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    rate_limit: Arc<RateLimiter>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config, shutdown_tx: broadcast::Sender<()>) -> Self {
        let rate_limit = Arc::new(RateLimiter::new(
            config.rate_limit.window_secs,
            config.rate_limit.max_requests,
        ));

        Self {
            store,
            rate_limit,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn rate_limit(&self) -> &Arc<RateLimiter> {
        &self.rate_limit
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_tx(&self) -> &broadcast::Sender<()> {
        &self.shutdown_tx
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
