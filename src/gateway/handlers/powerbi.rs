//! Usage: Power BI feed routes (hybrid key/cookie, service account, public mock).

use crate::analytics::mock;
use crate::analytics::powerbi::{creators_summary, earnings_detail, Authentication, FeedWindow};
use crate::gateway::cookies::RequestCookies;
use crate::gateway::handlers::{json_or_error, path_id, respond};
use crate::gateway::query::FeedQuery;
use crate::gateway::state::AppState;
use crate::infra::settings::AppSettings;
use crate::shared::error::AppResult;
use crate::shared::security::constant_time_eq;
use crate::upstream::credentials::Credentials;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

/// `apiKey` matching the configured Power BI key selects static-key mode; anything else needs
/// OAuth cookies.
fn hybrid_credentials(
    settings: &AppSettings,
    headers: &HeaderMap,
    q: &FeedQuery,
) -> AppResult<(Credentials, Authentication)> {
    let supplied = q.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
    if let (Some(supplied), Some(expected)) = (supplied, settings.powerbi_api_key()) {
        if constant_time_eq(supplied.as_bytes(), expected.as_bytes()) {
            return Ok((Credentials::api_key(settings)?, Authentication::ApiKey));
        }
        tracing::warn!("power bi api key mismatch; falling back to oauth cookies");
    }
    let cookies = RequestCookies::from_headers(headers);
    Ok((
        Credentials::oauth_only(cookies.token_pair())?,
        Authentication::OAuth,
    ))
}

fn window(q: &FeedQuery) -> FeedWindow {
    FeedWindow::from_query(q.start_date.as_deref(), q.end_date.as_deref(), Utc::now())
}

fn creator_filter(q: &FeedQuery) -> AppResult<Option<String>> {
    match q.creator_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Ok(Some(path_id(id)?.to_string())),
        None => Ok(None),
    }
}

pub(crate) async fn hybrid_creators_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<FeedQuery>,
) -> Response {
    let (credentials, authentication) = match hybrid_credentials(&state.settings, &headers, &q) {
        Ok(found) => found,
        Err(err) => return err.into_response(),
    };
    let session = state.session(credentials);
    let result = creators_summary(state.aggregation(&session), &window(&q), authentication).await;
    respond(&state, &session, result).await
}

pub(crate) async fn hybrid_earnings_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<FeedQuery>,
) -> Response {
    let creator_id = match creator_filter(&q) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let (credentials, authentication) = match hybrid_credentials(&state.settings, &headers, &q) {
        Ok(found) => found,
        Err(err) => return err.into_response(),
    };
    let session = state.session(credentials);
    let result = earnings_detail(
        state.aggregation(&session),
        &window(&q),
        creator_id.as_deref(),
        authentication,
    )
    .await;
    respond(&state, &session, result).await
}

// Service-account refreshes stay inside the request; nothing is written back as cookies.

pub(crate) async fn service_creators_summary(
    State(state): State<AppState>,
    Query(q): Query<FeedQuery>,
) -> Response {
    let credentials = match Credentials::service_account(&state.settings) {
        Ok(credentials) => credentials,
        Err(err) => return err.into_response(),
    };
    let session = state.session(credentials);
    let result = creators_summary(
        state.aggregation(&session),
        &window(&q),
        Authentication::ServiceAccount,
    )
    .await;
    json_or_error(result)
}

pub(crate) async fn service_earnings_detail(
    State(state): State<AppState>,
    Query(q): Query<FeedQuery>,
) -> Response {
    let creator_id = match creator_filter(&q) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let credentials = match Credentials::service_account(&state.settings) {
        Ok(credentials) => credentials,
        Err(err) => return err.into_response(),
    };
    let session = state.session(credentials);
    let result = earnings_detail(
        state.aggregation(&session),
        &window(&q),
        creator_id.as_deref(),
        Authentication::ServiceAccount,
    )
    .await;
    json_or_error(result)
}

pub(crate) async fn public_creators_summary(Query(q): Query<FeedQuery>) -> Response {
    Json(mock::creators_summary(&window(&q))).into_response()
}

pub(crate) async fn public_earnings_detail(Query(q): Query<FeedQuery>) -> Response {
    let creator_id = q.creator_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    Json(mock::earnings_detail(&window(&q), creator_id, Utc::now())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;

    fn settings() -> AppSettings {
        AppSettings {
            api_key: Some("static-key".to_string()),
            powerbi_api_key: Some("pbi-secret".to_string()),
            ..AppSettings::default()
        }
    }

    fn query(api_key: Option<&str>) -> FeedQuery {
        FeedQuery {
            api_key: api_key.map(str::to_string),
            ..FeedQuery::default()
        }
    }

    #[test]
    fn matching_key_selects_static_key_mode() {
        let (credentials, auth) =
            hybrid_credentials(&settings(), &HeaderMap::new(), &query(Some("pbi-secret")))
                .expect("credentials");
        assert_eq!(credentials, Credentials::ApiKey("static-key".to_string()));
        assert_eq!(auth, Authentication::ApiKey);
    }

    #[test]
    fn wrong_key_without_cookies_requires_auth() {
        let err = hybrid_credentials(&settings(), &HeaderMap::new(), &query(Some("guess")))
            .expect_err("rejected");
        assert_eq!(err.code(), "AUTH_REQUIRED");
    }

    #[test]
    fn cookies_are_used_when_no_key_is_supplied() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("fanvue_access_token=tok"));
        let (credentials, auth) =
            hybrid_credentials(&settings(), &headers, &query(None)).expect("credentials");
        assert_eq!(credentials.label(), "oauth");
        assert_eq!(auth, Authentication::OAuth);
    }
}
