//! HTTP plumbing shared by remote inference providers
//!
//! Handles authentication headers, status code mapping, optional retries with
//! exponential backoff, and (with the `rate-limit` feature) request throttling.
//! Providers build request bodies and decode responses; everything in between
//! lives here.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

#[cfg(feature = "rate-limit")]
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
#[cfg(feature = "rate-limit")]
use std::num::NonZeroU32;
#[cfg(feature = "rate-limit")]
use std::sync::Arc;

use crate::error::ServiceError;

/// Default timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Default requests per second limit
#[cfg(feature = "rate-limit")]
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

#[cfg(feature = "rate-limit")]
type InferenceRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// How requests authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// No credentials (local servers)
    None,
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `api-key: <key>` (Azure OpenAI)
    ApiKeyHeader(String),
}

/// Transport settings for a remote endpoint
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retry attempts for retryable failures (0 = single attempt)
    pub max_retries: u32,
    /// Requests per second limit (when rate-limit feature enabled)
    #[cfg(feature = "rate-limit")]
    pub requests_per_second: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 0,
            #[cfg(feature = "rate-limit")]
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

/// JSON-over-HTTP client for inference endpoints
#[derive(Clone)]
pub(crate) struct InferenceClient {
    client: Client,
    auth: Auth,
    headers: Vec<(&'static str, String)>,
    max_retries: u32,
    #[cfg(feature = "rate-limit")]
    rate_limiter: Arc<InferenceRateLimiter>,
}

impl InferenceClient {
    pub(crate) fn new(settings: &HttpSettings, auth: Auth) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Unavailable(format!("HTTP client error: {}", e)))?;

        #[cfg(feature = "rate-limit")]
        let rate_limiter = {
            let rps = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
            Arc::new(RateLimiter::direct(Quota::per_second(rps)))
        };

        Ok(Self {
            client,
            auth,
            headers: Vec::new(),
            max_retries: settings.max_retries,
            #[cfg(feature = "rate-limit")]
            rate_limiter,
        })
    }

    /// Add a static header sent with every request
    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    #[cfg(feature = "rate-limit")]
    async fn wait_for_permit(&self) {
        self.rate_limiter.until_ready().await;
    }

    #[cfg(not(feature = "rate-limit"))]
    async fn wait_for_permit(&self) {}

    /// POST a JSON body and decode the JSON response, retrying retryable failures
    pub(crate) async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut retry_delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 0;

        loop {
            self.wait_for_permit().await;

            match self.send_once(url, body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(
                        "Request to {} failed ({}), retry {}/{} in {:?}",
                        url, e, attempt, self.max_retries, retry_delay
                    );
                    tokio::time::sleep(retry_delay).await;
                    retry_delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send one request and measure latency; used for health checks
    pub(crate) async fn probe<B>(&self, url: &str, body: &B) -> Result<Duration, ServiceError>
    where
        B: Serialize + ?Sized,
    {
        let start = Instant::now();
        match self.send_once::<B, serde_json::Value>(url, body).await {
            Ok(_) => Ok(start.elapsed()),
            // Rate limited still means reachable
            Err(ServiceError::RateLimited { .. }) => Ok(start.elapsed()),
            Err(e) => Err(e),
        }
    }

    async fn send_once<B, R>(&self, url: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);

        match &self.auth {
            Auth::None => {}
            Auth::Bearer(token) => {
                request = request.header("Authorization", format!("Bearer {}", token));
            }
            Auth::ApiKeyHeader(key) => {
                request = request.header("api-key", key);
            }
        }
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Unavailable("Request timed out".into())
            } else if e.is_connect() {
                ServiceError::Unavailable(format!("Connection failed: {}", e))
            } else {
                ServiceError::Unavailable(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();

        match status {
            StatusCode::OK => response
                .json::<R>()
                .await
                .map_err(|e| ServiceError::InvalidResponse(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(ServiceError::Auth(body))
            }
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(ServiceError::ModelNotFound(body))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());
                Err(ServiceError::RateLimited { retry_after })
            }
            s if s.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(ServiceError::Unavailable(format!("status {}: {}", s, body)))
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(ServiceError::InvalidResponse(format!(
                    "status {}: {}",
                    s, body
                )))
            }
        }
    }
}

impl std::fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials stay out of debug output
        let auth = match self.auth {
            Auth::None => "none",
            Auth::Bearer(_) => "bearer",
            Auth::ApiKeyHeader(_) => "api-key",
        };
        f.debug_struct("InferenceClient")
            .field("auth", &auth)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
