use crate::config::toml_config::{RetryConfig, SourceConfig};
use crate::core::rate_limiter::RateLimiter;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, RETRY_AFTER};
use reqwest::{Client, Response};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Retry budget and exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Result<Self> {
        Ok(Self {
            max_attempts: config.max_attempts.max(1),
            backoff_factor: validation::seconds_to_duration(
                "retry.backoff_factor_seconds",
                config.backoff_factor_seconds.max(0.0),
            )?,
            max_backoff: validation::seconds_to_duration(
                "retry.max_backoff_seconds",
                config.max_backoff_seconds.max(0.0),
            )?,
            retry_statuses: config.retry_statuses.clone(),
        })
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delays double from `backoff_factor` and are capped by `max_backoff`.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.backoff_factor)
            .with_max_delay(self.max_backoff)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }

    /// Retryable statuses and transport failures get another attempt.
    pub fn is_retryable(&self, error: &EtlError) -> bool {
        match error {
            EtlError::HttpStatusError { status, .. } => self.should_retry_status(*status),
            other => other.is_transient(),
        }
    }

    /// A server hint replaces the computed delay, still capped.
    fn adjust_delay(&self, error: &EtlError, next: Option<Duration>) -> Option<Duration> {
        let next = next?;
        Some(error.retry_after().map_or(next, |hint| hint.min(self.max_backoff)))
    }
}

/// Shared connection pool with browser-like headers, cookies and retries.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(source: &SourceConfig, retry: RetryPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        let origin = HeaderValue::from_str(&source.origin).map_err(|e| EtlError::ConfigError {
            message: format!("invalid origin header '{}': {}", source.origin, e),
        })?;
        headers.insert(ORIGIN, origin);

        let client = Client::builder()
            .user_agent(source.user_agent.clone())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(source.request_timeout())
            .build()?;

        Ok(Self { client, retry })
    }

    /// Plain GET that primes the cookie jar. Failures are only logged.
    pub async fn warm_up(&self, url: &str) {
        match self.client.get(url).send().await {
            Ok(response) => {
                tracing::debug!("Warm-up request to {} returned {}", url, response.status())
            }
            Err(e) => tracing::warn!("Warm-up request to {} failed: {}", url, e),
        }
    }

    /// Form-encoded POST returning the response body.
    ///
    /// Every attempt, retries included, first waits on `limiter` under
    /// `label`. Transport failures and retryable statuses are attempted up to
    /// the policy budget; exhausting it yields `RetryExhaustedError`.
    pub async fn post_form(
        &self,
        limiter: &RateLimiter,
        label: &str,
        url: &str,
        form: &[(&str, String)],
        referer: Option<&str>,
    ) -> Result<String> {
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let attempt = move || async move {
            attempts.fetch_add(1, Ordering::Relaxed);
            limiter.wait(label).await;
            self.send_once(url, form, referer).await
        };

        let result = attempt
            .retry(self.retry.backoff())
            .sleep(sleep)
            .when(|err: &EtlError| self.retry.is_retryable(err))
            .adjust(|err: &EtlError, next: Option<Duration>| self.retry.adjust_delay(err, next))
            .notify(|err: &EtlError, delay: Duration| {
                tracing::warn!(
                    url,
                    attempt = attempts.load(Ordering::Relaxed),
                    max_attempts = self.retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying request"
                );
            })
            .await;

        match result {
            Ok(body) => Ok(body),
            Err(err) if self.retry.is_retryable(&err) => Err(EtlError::RetryExhaustedError {
                url: url.to_string(),
                attempts: attempts.load(Ordering::Relaxed),
                last_error: err.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn send_once(
        &self,
        url: &str,
        form: &[(&str, String)],
        referer: Option<&str>,
    ) -> Result<String> {
        let mut request = self.client.post(url).form(form);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                url: url.to_string(),
                retry_after: retry_after_hint(&response),
            });
        }

        Ok(response.text().await?)
    }
}

fn retry_after_hint(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, Utc::now())
}

/// `Retry-After` is either delta-seconds or an HTTP date.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
