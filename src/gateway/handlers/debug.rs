//! Usage: Diagnostics that report presence only; secret values never leave the process.

use crate::gateway::cookies::{
    RequestCookies, ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE, REFRESH_TOKEN_COOKIE, STATE_COOKIE,
    TOKEN_TYPE_COOKIE,
};
use crate::gateway::state::AppState;
use crate::infra::settings::AppSettings;
use crate::shared::time::now_iso8601;
use crate::upstream::credentials::Credentials;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CookiePresence {
    access_token: bool,
    refresh_token: bool,
    token_type: bool,
    code_verifier: bool,
    oauth_state: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthDebug {
    cookies: CookiePresence,
    /// `oauth`, `api_key`, or `none` when no credentials resolve.
    credentials: &'static str,
    token_state: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvDebug {
    has_api_key: bool,
    has_oauth_client_id: bool,
    has_oauth_client_secret: bool,
    has_oauth_redirect_uri: bool,
    has_powerbi_api_key: bool,
    has_service_access_token: bool,
    has_service_refresh_token: bool,
    api_version: String,
    secure_cookies: bool,
    timestamp: String,
}

fn present(value: Option<&str>) -> bool {
    value.map(str::trim).is_some_and(|v| !v.is_empty())
}

pub(crate) async fn auth(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthDebug> {
    let cookies = RequestCookies::from_headers(&headers);
    let presence = CookiePresence {
        access_token: cookies.has(ACCESS_TOKEN_COOKIE),
        refresh_token: cookies.has(REFRESH_TOKEN_COOKIE),
        token_type: cookies.has(TOKEN_TYPE_COOKIE),
        code_verifier: cookies.has(CODE_VERIFIER_COOKIE),
        oauth_state: cookies.has(STATE_COOKIE),
    };
    let (credentials, token_state) =
        match Credentials::prefer_oauth(&state.settings, cookies.token_pair()) {
            Ok(credentials) => {
                let session = state.session(credentials);
                (
                    session.credentials_label().await,
                    session.token_state().await.as_str(),
                )
            }
            Err(_) => ("none", "no_tokens"),
        };
    Json(AuthDebug {
        cookies: presence,
        credentials,
        token_state,
        timestamp: now_iso8601(),
    })
}

fn env_report(settings: &AppSettings) -> EnvDebug {
    EnvDebug {
        has_api_key: settings.api_key().is_some(),
        has_oauth_client_id: present(settings.oauth_client_id.as_deref()),
        has_oauth_client_secret: present(settings.oauth_client_secret.as_deref()),
        has_oauth_redirect_uri: present(settings.oauth_redirect_uri.as_deref()),
        has_powerbi_api_key: settings.powerbi_api_key().is_some(),
        has_service_access_token: settings.service_access_token().is_some(),
        has_service_refresh_token: settings.service_refresh_token().is_some(),
        api_version: settings.api_version.clone(),
        secure_cookies: settings.secure_cookies,
        timestamp: now_iso8601(),
    }
}

pub(crate) async fn env(State(state): State<AppState>) -> Json<EnvDebug> {
    Json(env_report(&state.settings))
}
