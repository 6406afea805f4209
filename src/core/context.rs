use crate::config::toml_config::{ScraperConfig, SourceConfig};
use crate::core::http::{HttpClient, RetryPolicy};
use crate::core::rate_limiter::RateLimiter;
use crate::utils::error::Result;

pub const SEARCH_LABEL: &str = "search";
pub const DETAIL_LABEL: &str = "detail";

/// Everything a crawl step needs to talk to the portal.
///
/// Search and detail calls go through separate limiters; detail calls are far
/// more numerous and run on a shorter interval.
#[derive(Debug)]
pub struct CrawlContext {
    pub http: HttpClient,
    pub search_limiter: RateLimiter,
    pub detail_limiter: RateLimiter,
    pub source: SourceConfig,
}

impl CrawlContext {
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let http = HttpClient::new(&config.source, RetryPolicy::from_config(&config.retry)?)?;
        Ok(Self {
            http,
            search_limiter: RateLimiter::new(
                config.rate_limit.search_interval_seconds,
                config.rate_limit.search_jitter_seconds,
            )?,
            detail_limiter: RateLimiter::new(
                config.rate_limit.detail_interval_seconds,
                config.rate_limit.detail_jitter_seconds,
            )?,
            source: config.source.clone(),
        })
    }

    pub fn detail_page_url(&self, id: &str) -> String {
        self.source.detail_page_url.replace("{id}", id)
    }
}
