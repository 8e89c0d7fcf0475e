//! Usage: Refresh-token grant execution with bounded linear retry on transport failures.

use crate::infra::settings::AppSettings;
use crate::oauth::token_exchange::{is_grant_rejection, refresh_access_token, TokenEndpoint};
use crate::oauth::tokens::TokenPair;
use crate::shared::error::AppResult;
use crate::shared::security::mask_token;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct TokenManager {
    http: reqwest::Client,
    endpoint: Option<TokenEndpoint>,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl TokenManager {
    pub(crate) fn new(http: reqwest::Client, settings: &AppSettings) -> Self {
        // Refresh needs id + secret only; the redirect URI matters for the code grant.
        let endpoint = match (
            settings.oauth_client_id.as_deref().map(str::trim),
            settings.oauth_client_secret.as_deref().map(str::trim),
        ) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(TokenEndpoint {
                    token_uri: settings.token_endpoint(),
                    client_id: id.to_string(),
                    client_secret: secret.to_string(),
                })
            }
            _ => None,
        };
        Self {
            http,
            endpoint,
            max_attempts: settings.refresh_max_attempts.max(1),
            retry_base_delay: settings.refresh_retry_base_delay(),
        }
    }

    pub(crate) fn endpoint(&self) -> AppResult<&TokenEndpoint> {
        self.endpoint.as_ref().ok_or_else(|| {
            "CONFIG_MISSING: oauth client credentials are not configured".to_string().into()
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchanges `tokens.refresh_token` for a new pair. Transport and 5xx failures are retried
    /// linearly; a 4xx rejection ends immediately.
    pub(crate) async fn refresh(&self, tokens: &TokenPair) -> AppResult<TokenPair> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| "AUTH_REQUIRED: session has no refresh token".to_string())?;
        let endpoint = self.endpoint()?;

        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match refresh_access_token(&self.http, endpoint, refresh_token).await {
                Ok(next) => {
                    tracing::info!(
                        refresh_token = %mask_token(refresh_token),
                        attempt = attempt,
                        "oauth access token refreshed"
                    );
                    return Ok(tokens.rotated(next));
                }
                Err(err) if attempt < max_attempts && !is_grant_rejection(err.code()) => {
                    let delay = self.retry_base_delay.saturating_mul(attempt);
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "oauth refresh failed; retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        attempt = attempt,
                        code = %err.code(),
                        "oauth refresh failed: {}",
                        err.message()
                    );
                    return Err(err);
                }
            }
        }
    }
}
