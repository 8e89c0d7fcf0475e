//! Usage: Route handlers plus the session/response plumbing they share.

pub(crate) mod aggregate;
pub(crate) mod auth;
pub(crate) mod creator;
pub(crate) mod debug;
pub(crate) mod passthrough;
pub(crate) mod powerbi;

use crate::gateway::cookies::{append_set_cookies, token_cookies, RequestCookies};
use crate::gateway::state::AppState;
use crate::shared::error::AppResult;
use crate::upstream::credentials::Credentials;
use crate::upstream::session::UpstreamSession;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Dashboard routes: cookie tokens when present, otherwise the static key.
pub(crate) fn dashboard_session(
    state: &AppState,
    headers: &HeaderMap,
) -> AppResult<UpstreamSession> {
    let cookies = RequestCookies::from_headers(headers);
    let credentials = Credentials::prefer_oauth(&state.settings, cookies.token_pair())?;
    Ok(state.session(credentials))
}

pub(crate) fn json_or_error<T: Serialize>(result: AppResult<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Like `json_or_error`, writing a refreshed token pair back to the browser.
pub(crate) async fn respond<T: Serialize>(
    state: &AppState,
    session: &UpstreamSession,
    result: AppResult<T>,
) -> Response {
    let mut response = json_or_error(result);
    if let Some(pair) = session.rotated_tokens().await {
        tracing::debug!("writing refreshed token cookies");
        append_set_cookies(
            response.headers_mut(),
            &token_cookies(&pair),
            state.settings.secure_cookies,
        );
    }
    response
}

/// Upstream identifiers are interpolated into paths; only id-shaped values pass.
pub(crate) fn path_id(raw: &str) -> AppResult<&str> {
    let id = raw.trim();
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(id)
    } else {
        Err("SEC_INVALID_INPUT: invalid creator id".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_id_accepts_uuids_only() {
        assert_eq!(
            path_id(" e507b598-4347-4ea5-b27d-4367ea351ab9 ").expect("uuid"),
            "e507b598-4347-4ea5-b27d-4367ea351ab9"
        );
        for bad in ["", "../users/me", "a/b", "x?y=1", "id%2F"] {
            assert_eq!(path_id(bad).expect_err(bad).code(), "SEC_INVALID_INPUT");
        }
    }
}
