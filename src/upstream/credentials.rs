//! Usage: How a request authenticates against the Fanvue API (static key or OAuth token pair).

use crate::infra::settings::AppSettings;
use crate::oauth::tokens::TokenPair;
use crate::shared::error::AppResult;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

pub(crate) const API_KEY_HEADER: &str = "X-Fanvue-API-Key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Credentials {
    ApiKey(String),
    OAuth(TokenPair),
}

impl Credentials {
    /// OAuth cookies win when present; the static key is the fallback.
    pub(crate) fn prefer_oauth(
        settings: &AppSettings,
        session_tokens: Option<TokenPair>,
    ) -> AppResult<Self> {
        if let Some(tokens) = session_tokens {
            return Ok(Credentials::OAuth(tokens));
        }
        Self::api_key(settings)
    }

    pub(crate) fn api_key(settings: &AppSettings) -> AppResult<Self> {
        settings
            .api_key()
            .map(|key| Credentials::ApiKey(key.to_string()))
            .ok_or_else(|| "CONFIG_MISSING: FANVUE_API_KEY is not set".to_string().into())
    }

    pub(crate) fn oauth_only(session_tokens: Option<TokenPair>) -> AppResult<Self> {
        session_tokens
            .map(Credentials::OAuth)
            .ok_or_else(|| "AUTH_REQUIRED: not authenticated with Fanvue".to_string().into())
    }

    /// Static pair from configuration; refreshed copies live only inside one request.
    pub(crate) fn service_account(settings: &AppSettings) -> AppResult<Self> {
        let access = settings.service_access_token().ok_or_else(|| {
            "CONFIG_MISSING: SERVICE_ACCESS_TOKEN is not set".to_string()
        })?;
        let pair = TokenPair::new(
            access,
            settings.service_refresh_token().map(str::to_string),
            None,
        )
        .ok_or_else(|| "CONFIG_MISSING: SERVICE_ACCESS_TOKEN is not set".to_string())?;
        Ok(Credentials::OAuth(pair))
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Credentials::ApiKey(_) => "api_key",
            Credentials::OAuth(_) => "oauth",
        }
    }

    pub(crate) fn token_pair(&self) -> Option<&TokenPair> {
        match self {
            Credentials::OAuth(pair) => Some(pair),
            Credentials::ApiKey(_) => None,
        }
    }

    pub(crate) fn headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        match self {
            Credentials::ApiKey(key) => {
                let value = HeaderValue::from_str(key)
                    .map_err(|_| "CONFIG_MISSING: FANVUE_API_KEY is not a valid header value")?;
                headers.insert(API_KEY_HEADER, value);
            }
            Credentials::OAuth(pair) => {
                let mut value = HeaderValue::from_str(&pair.authorization_value())
                    .map_err(|_| "AUTH_REQUIRED: access token is not a valid header value")?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }
        Ok(headers)
    }
}
