//! Usage: Shared router state and per-request session construction.

use crate::analytics::batch::FanOut;
use crate::analytics::Aggregation;
use crate::infra::settings::AppSettings;
use crate::oauth::token_manager::TokenManager;
use crate::shared::error::AppResult;
use crate::upstream::client::{RetryPolicy, UpstreamClient};
use crate::upstream::credentials::Credentials;
use crate::upstream::session::UpstreamSession;
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable after startup; cloned into every handler.
#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub(crate) settings: Arc<AppSettings>,
    pub(crate) client: Arc<UpstreamClient>,
    pub(crate) tokens: Arc<TokenManager>,
}

impl AppState {
    pub(crate) fn new(settings: AppSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("fanvue-agency-hub/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(settings.upstream_request_timeout())
            .build()
            .map_err(|e| format!("SYSTEM_ERROR: http client init failed: {e}"))?;

        let client = UpstreamClient::new(
            http.clone(),
            &settings.api_base_url,
            &settings.api_version,
            RetryPolicy {
                max_retries: settings.rate_limit_max_retries,
                base_delay: settings.rate_limit_base_delay(),
            },
        )?;
        let tokens = TokenManager::new(http, &settings);

        Ok(Self {
            settings: Arc::new(settings),
            client: Arc::new(client),
            tokens: Arc::new(tokens),
        })
    }

    pub(crate) fn session(&self, credentials: Credentials) -> UpstreamSession {
        UpstreamSession::new(self.client.clone(), self.tokens.clone(), credentials)
    }

    pub(crate) fn aggregation<'a>(&self, session: &'a UpstreamSession) -> Aggregation<'a> {
        let batch_size = usize::try_from(self.settings.fanout_batch_size).unwrap_or(1);
        Aggregation {
            session,
            page_delay: self.settings.page_delay(),
            fanout: FanOut::new(batch_size, self.settings.fanout_batch_delay()),
        }
    }
}
