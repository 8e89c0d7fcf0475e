//! Usage: Fanvue API client wrapper (URL building, version header, 429 exponential backoff).

use crate::shared::error::AppResult;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{StatusCode, Url};
use std::time::Duration;

pub(crate) const API_VERSION_HEADER: &str = "X-Fanvue-API-Version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) base_delay: Duration,
}

impl RetryPolicy {
    /// Wait before retry number `attempt + 1`: 2, 4, 8... times the base delay.
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_add(1));
        self.base_delay.saturating_mul(factor)
    }
}

pub(crate) fn classify_reqwest_error(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        return "upstream timeout";
    }
    if err.is_connect() {
        return "upstream connect failed";
    }
    "upstream request failed"
}

#[derive(Debug, Clone)]
pub(crate) struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    api_version: HeaderValue,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: &str,
        api_version: &str,
        retry: RetryPolicy,
    ) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|e| format!("SEC_INVALID_INPUT: invalid upstream base url: {e}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let api_version = HeaderValue::from_str(api_version.trim())
            .map_err(|e| format!("SEC_INVALID_INPUT: invalid api version header: {e}"))?;
        Ok(Self {
            http,
            base_url,
            api_version,
            retry,
        })
    }

    pub(crate) fn url(&self, path: &str, query: &[(&str, String)]) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| format!("SEC_INVALID_INPUT: invalid upstream path {path}: {e}"))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET request carrying the version header plus whatever `auth` contributes.
    pub(crate) fn get_request(&self, url: Url, auth: HeaderMap) -> AppResult<reqwest::Request> {
        let mut headers = auth;
        headers.insert(API_VERSION_HEADER, self.api_version.clone());
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        self.http
            .get(url)
            .headers(headers)
            .build()
            .map_err(|e| format!("SYSTEM_ERROR: failed to build upstream request: {e}").into())
    }

    /// Sends `request`, retrying only on 429. Every other status comes back untouched.
    pub(crate) async fn fetch_with_retry(
        &self,
        request: reqwest::Request,
    ) -> AppResult<reqwest::Response> {
        let max_retries = self.retry.max_retries;
        let total_attempts = max_retries.saturating_add(1);
        let path = request.url().path().to_string();

        for attempt in 0..=max_retries {
            let attempt_request = request.try_clone().ok_or_else(|| {
                "SYSTEM_ERROR: upstream request body is not cloneable".to_string()
            })?;
            let response = self.http.execute(attempt_request).await.map_err(|err| {
                let kind = classify_reqwest_error(&err);
                tracing::warn!(path = %path, attempt = attempt + 1, "{kind}: {err}");
                format!("UPSTREAM_UNAVAILABLE: {kind}: {err}")
            })?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            if attempt == max_retries {
                break;
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                path = %path,
                attempt = attempt + 1,
                total_attempts = total_attempts,
                delay_ms = delay.as_millis() as u64,
                "upstream rate limited; retrying"
            );
            tokio::time::sleep(delay).await;
        }

        Err(format!(
            "UPSTREAM_RATE_LIMITED: rate limit exceeded after {max_retries} retries"
        )
        .into())
    }
}
