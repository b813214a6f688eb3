use std::sync::Arc;

use cache::{RateLimiter, TtlCache};
use config::Config;
use fetcher::Fetcher;
use gateway::ModelGateway;
use routes::generate::GenerateResponse;
use tokio::task::JoinHandle;

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod middleware;
pub mod normalizer;
pub mod prompt;
pub mod routes;
pub mod utils;

pub use routes::create_router;

/// Shared per-process components, built once at start-up and handed to every
/// request through axum state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Fetcher,
    pub gateway: ModelGateway,
    pub cache: Arc<TtlCache<GenerateResponse>>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let fetcher = Fetcher::new(
            config.fetch_timeout(),
            config.article_char_budget,
            config.max_upload_bytes,
        )?;
        let gateway = ModelGateway::new(config.model_timeout())?;
        let cache = Arc::new(TtlCache::new(config.cache_ttl(), config.cache_max_entries));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_requests,
            config.rate_limit_window(),
            config.rate_limit_max_keys,
        ));

        Ok(AppState {
            config: Arc::new(config),
            fetcher,
            gateway,
            cache,
            rate_limiter,
        })
    }

    /// Periodically drops expired cache entries and elapsed rate-limit
    /// windows. Abort the handle on shutdown.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let cache = self.cache.clone();
        let limiter = self.rate_limiter.clone();
        let period = self.config.cache_sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = cache.purge_expired();
                let windows = limiter.sweep();
                if expired > 0 || windows > 0 {
                    tracing::debug!(expired, windows, "Swept in-memory state");
                }
            }
        })
    }
}
