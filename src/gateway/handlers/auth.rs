//! Usage: OAuth routes: consent redirect, code callback, logout.

use crate::gateway::cookies::{
    append_set_cookies, clear_pkce_cookies, clear_token_cookies, token_cookies, RequestCookies,
    SetCookie, CODE_VERIFIER_COOKIE, PKCE_MAX_AGE, STATE_COOKIE,
};
use crate::gateway::state::AppState;
use crate::infra::settings::AppSettings;
use crate::oauth::authorize::{
    build_authorize_url, verify_callback, AuthorizeRequest, CallbackParams, CallbackRejection,
};
use crate::oauth::pkce::{generate_pkce_pair, generate_state};
use crate::oauth::token_exchange::{
    exchange_authorization_code, TokenEndpoint, TokenExchangeRequest,
};
use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Url;

const NO_DETAILS: &str = "No details provided";

/// 302 with the given cookies attached.
fn found(location: &str, cookies: &[SetCookie], secure: bool) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(_) => {
            tracing::error!("redirect location is not valid header text");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    append_set_cookies(response.headers_mut(), cookies, secure);
    response
}

/// Dashboard root with url-encoded query pairs.
pub(crate) fn dashboard_location(settings: &AppSettings, pairs: &[(&str, &str)]) -> String {
    let base = settings.dashboard_url.trim().trim_end_matches('/');
    match Url::parse(&format!("{base}/")) {
        Ok(mut url) => {
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
            url.to_string()
        }
        Err(err) => {
            tracing::warn!(dashboard_url = %base, "dashboard url does not parse: {err}");
            "/".to_string()
        }
    }
}

pub(crate) async fn authorize(State(state): State<AppState>) -> Response {
    let settings = &state.settings;
    let client = match settings.oauth_client() {
        Ok(client) => client,
        Err(err) => return err.into_response(),
    };
    let pkce = generate_pkce_pair();
    let csrf_state = generate_state();
    let authorize_endpoint = settings.authorize_endpoint();
    let url = match build_authorize_url(&AuthorizeRequest {
        authorize_endpoint: &authorize_endpoint,
        client_id: &client.client_id,
        redirect_uri: &client.redirect_uri,
        scopes: &settings.oauth_scopes,
        state: &csrf_state,
        code_challenge: &pkce.code_challenge,
    }) {
        Ok(url) => url,
        Err(err) => return err.into_response(),
    };

    tracing::info!("redirecting to fanvue consent");
    found(
        &url,
        &[
            SetCookie::new(CODE_VERIFIER_COOKIE, pkce.code_verifier, PKCE_MAX_AGE),
            SetCookie::new(STATE_COOKIE, csrf_state, PKCE_MAX_AGE),
        ],
        settings.secure_cookies,
    )
}

pub(crate) async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let settings = &state.settings;
    let secure = settings.secure_cookies;
    let cookies = RequestCookies::from_headers(&headers);

    let verified = match verify_callback(
        &params,
        cookies.get(STATE_COOKIE),
        cookies.get(CODE_VERIFIER_COOKIE),
    ) {
        Ok(verified) => verified,
        Err(CallbackRejection::ProviderError) => {
            let error = params.error.as_deref().unwrap_or_default().trim();
            let details = params
                .error_description
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(NO_DETAILS);
            tracing::warn!(error = %error, "authorization server returned an error");
            let location = dashboard_location(settings, &[("error", error), ("details", details)]);
            return found(&location, &clear_pkce_cookies(), secure);
        }
        Err(rejection) => {
            tracing::warn!(reason = rejection.as_query_value(), "oauth callback rejected");
            let location = dashboard_location(settings, &[("error", rejection.as_query_value())]);
            return found(&location, &clear_pkce_cookies(), secure);
        }
    };

    let client = match settings.oauth_client() {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("oauth callback without client config: {}", err.message());
            let location = dashboard_location(settings, &[("error", "oauth_config_missing")]);
            return found(&location, &clear_pkce_cookies(), secure);
        }
    };
    let endpoint = TokenEndpoint {
        token_uri: settings.token_endpoint(),
        client_id: client.client_id,
        client_secret: client.client_secret,
    };
    let request = TokenExchangeRequest {
        code: verified.code,
        redirect_uri: client.redirect_uri,
        code_verifier: verified.code_verifier,
    };

    match exchange_authorization_code(state.tokens.http(), &endpoint, &request).await {
        Ok(pair) => {
            tracing::info!(
                has_refresh_token = pair.refresh_token.is_some(),
                "oauth code exchange completed"
            );
            let mut set = token_cookies(&pair);
            set.extend(clear_pkce_cookies());
            found(&dashboard_location(settings, &[("success", "true")]), &set, secure)
        }
        Err(err) => {
            tracing::error!(code = %err.code(), "oauth code exchange failed: {}", err.message());
            let location = dashboard_location(
                settings,
                &[("error", "token_exchange_failed"), ("details", err.message())],
            );
            found(&location, &clear_pkce_cookies(), secure)
        }
    }
}

pub(crate) async fn logout(State(state): State<AppState>) -> Response {
    tracing::info!("clearing session cookies");
    found(
        &dashboard_location(&state.settings, &[]),
        &clear_token_cookies(),
        state.settings.secure_cookies,
    )
}
