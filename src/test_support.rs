//! Usage: Public test helpers for integration tests.

use crate::infra::settings::AppSettings;
use crate::shared::error::AppResult;

pub const TEST_API_KEY: &str = "test-static-key";
pub const TEST_CLIENT_ID: &str = "test-client";
pub const TEST_CLIENT_SECRET: &str = "test-secret";
pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/api/auth/callback";
pub const TEST_DASHBOARD_URL: &str = "http://dashboard.test";

/// Settings pointing both upstreams at `base_url` (a mock server) with every delay near zero.
pub fn settings_for(base_url: &str) -> AppSettings {
    AppSettings {
        api_base_url: base_url.to_string(),
        auth_base_url: base_url.to_string(),
        dashboard_url: TEST_DASHBOARD_URL.to_string(),
        api_key: Some(TEST_API_KEY.to_string()),
        oauth_client_id: Some(TEST_CLIENT_ID.to_string()),
        oauth_client_secret: Some(TEST_CLIENT_SECRET.to_string()),
        oauth_redirect_uri: Some(TEST_REDIRECT_URI.to_string()),
        rate_limit_base_delay_ms: 1,
        page_delay_ms: 0,
        fanout_batch_delay_ms: 0,
        refresh_retry_base_delay_ms: 1,
        ..AppSettings::default()
    }
}

/// The production router over `settings`.
pub fn router(settings: AppSettings) -> AppResult<axum::Router> {
    let state = crate::gateway::state::AppState::new(settings)?;
    Ok(crate::gateway::routes::build_router(state))
}
