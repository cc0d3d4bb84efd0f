//! HTTP client with rate limiting for the SoundCloud API.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * Request rate limiting to stay polite against the public API
//! * A browser-like `User-Agent` on every request
//!
//! # Rate Limiting
//!
//! * 50 calls per 5-second interval
//! * Automatic request throttling
//! * Allows bursts up to the maximum calls per interval
//! * Requests that would exceed the limit are delayed, never dropped
//!
//! Media downloads (CDN traffic) bypass the limiter through the public
//! [`unlimited`](Client::unlimited) client; only API calls are throttled.
//!
//! Deliberately absent: read timeouts. Downloads are awaited to completion
//! however long they take, and nothing here retries or cancels.
//!
//! # Example
//!
//! ```rust
//! use downpour::{config::Config, http::Client};
//!
//! let client = Client::new(&Config::new())?;
//!
//! // Make rate-limited requests
//! let request = client.get(url, "");
//! let response = client.execute(request).await?;
//! ```

use std::{future::Future, num::NonZeroU32, sync::Arc, time::Duration};

use futures_util::{FutureExt, TryFutureExt};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{self, Body, Method, Url};

use crate::{config::Config, error::Result};

/// HTTP client with built-in rate limiting.
///
/// Cloning is cheap: clones share the same connection pool and the same
/// rate limiter, so the quota holds across all of them.
#[derive(Clone)]
pub struct Client {
    /// Unlimited request client for CDN media traffic.
    ///
    /// Direct access to the underlying client without rate limiting.
    pub unlimited: reqwest::Client,

    /// Rate limiter for API quota compliance.
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl Client {
    /// Length of the rate limit window.
    const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(5);

    /// Maximum API calls per window.
    ///
    /// Requests beyond this limit will be automatically delayed.
    const RATE_LIMIT_CALLS_PER_INTERVAL: u8 = 50;

    /// Duration to keep idle connections alive.
    ///
    /// Prevents frequent reconnection overhead for subsequent requests.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a new client from the configured identity.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    ///
    /// # Panics
    ///
    /// Panics if rate limit parameters are zero.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .user_agent(&config.user_agent);

        // Rate limit own requests as to not DoS the SoundCloud infrastructure.
        let replenish_interval =
            Self::RATE_LIMIT_INTERVAL / u32::from(Self::RATE_LIMIT_CALLS_PER_INTERVAL);
        let quota = Quota::with_period(replenish_interval)
            .expect("quota time interval is zero")
            .allow_burst(
                NonZeroU32::new(Self::RATE_LIMIT_CALLS_PER_INTERVAL.into())
                    .expect("calls per interval is zero"),
            );

        Ok(Self {
            unlimited: http_client.build()?,
            rate_limiter: Arc::new(governor::RateLimiter::direct(quota)),
        })
    }

    /// Builds a request with specified method, URL and body.
    ///
    /// Creates a raw request that can be executed with `execute()`.
    pub fn request<U, T>(&self, method: Method, url: U, body: T) -> reqwest::Request
    where
        U: Into<Url>,
        T: Into<Body>,
    {
        let mut request = reqwest::Request::new(method, url.into());
        let body_mut = request.body_mut();
        *body_mut = Some(body.into());

        request
    }

    /// Builds a GET request.
    ///
    /// Convenience method for `request()` with GET method.
    ///
    /// # Arguments
    ///
    /// * `url` - Request URL
    /// * `body` - Request body content (usually empty)
    pub fn get<U, T>(&self, url: U, body: T) -> reqwest::Request
    where
        U: Into<Url>,
        T: Into<Body>,
    {
        self.request(Method::GET, url, body)
    }

    /// Executes a request with rate limiting.
    ///
    /// Applies rate limiting before executing the request to
    /// comply with API quotas.
    ///
    /// # Errors
    ///
    /// Returns error if request execution fails.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        // No need to await with jitter because the level of concurrency is low.
        let throttle = self.rate_limiter.until_ready();
        throttle.then(|()| self.unlimited.execute(request).map_err(Into::into))
    }
}
