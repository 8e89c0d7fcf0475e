//! Usage: Per-request upstream binding of client + credentials; owns the 401
//! refresh-and-retry-once rule.

use crate::oauth::token_exchange::is_grant_rejection;
use crate::oauth::token_manager::TokenManager;
use crate::oauth::tokens::{TokenPair, TokenState};
use crate::shared::error::{AppError, AppResult};
use crate::shared::security::sanitize_body_snippet;
use crate::upstream::client::UpstreamClient;
use crate::upstream::credentials::Credentials;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
struct SessionAuth {
    credentials: Credentials,
    state: TokenState,
    rotated: bool,
}

#[derive(Debug)]
pub(crate) struct UpstreamSession {
    client: Arc<UpstreamClient>,
    tokens: Arc<TokenManager>,
    // Held across the refresh so concurrent 401s inside one request refresh once.
    auth: Mutex<SessionAuth>,
}

impl UpstreamSession {
    pub(crate) fn new(
        client: Arc<UpstreamClient>,
        tokens: Arc<TokenManager>,
        credentials: Credentials,
    ) -> Self {
        let state = match credentials {
            Credentials::OAuth(_) => TokenState::Valid,
            Credentials::ApiKey(_) => TokenState::NoTokens,
        };
        Self {
            client,
            tokens,
            auth: Mutex::new(SessionAuth {
                credentials,
                state,
                rotated: false,
            }),
        }
    }

    pub(crate) async fn token_state(&self) -> TokenState {
        self.auth.lock().await.state
    }

    pub(crate) async fn credentials_label(&self) -> &'static str {
        self.auth.lock().await.credentials.label()
    }

    /// The refreshed pair, when a refresh happened during this request.
    pub(crate) async fn rotated_tokens(&self) -> Option<TokenPair> {
        let auth = self.auth.lock().await;
        if !auth.rotated {
            return None;
        }
        auth.credentials.token_pair().cloned()
    }

    async fn send(
        &self,
        credentials: &Credentials,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<reqwest::Response> {
        let url = self.client.url(path, query)?;
        let request = self.client.get_request(url, credentials.headers()?)?;
        self.client.fetch_with_retry(request).await
    }

    /// GET `path`. A 401 under OAuth triggers one refresh and one retry; the retry's
    /// response is returned whatever its status.
    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<reqwest::Response> {
        let used = self.auth.lock().await.credentials.clone();
        let response = self.send(&used, path, query).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Credentials::OAuth(used_pair) = &used else {
            return Ok(response);
        };

        let next = {
            let mut auth = self.auth.lock().await;
            let Some(current) = auth.credentials.token_pair().cloned() else {
                return Ok(response);
            };
            if current.access_token != used_pair.access_token {
                // Another call in this request already rotated the pair.
                current
            } else if auth.state == TokenState::RefreshFailed || !current.can_refresh() {
                auth.state = TokenState::RefreshFailed;
                return Err("AUTH_REQUIRED: session expired; please sign in again".into());
            } else {
                auth.state = TokenState::ExpiredNeedsRefresh;
                tracing::info!(path = %path, "upstream returned 401; refreshing access token");
                match self.tokens.refresh(&current).await {
                    Ok(next) => {
                        auth.credentials = Credentials::OAuth(next.clone());
                        auth.state = TokenState::Valid;
                        auth.rotated = true;
                        next
                    }
                    Err(err) => {
                        auth.state = TokenState::RefreshFailed;
                        return Err(refresh_failure(err));
                    }
                }
            }
        };

        self.send(&Credentials::OAuth(next), path, query).await
    }

    /// GET `path` and decode the body; any non-OK status becomes a pass-through error.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self.get(path, query).await?;
        read_json(response).await
    }
}

fn refresh_failure(err: AppError) -> AppError {
    match err.code() {
        "CONFIG_MISSING" => err,
        code if is_grant_rejection(code) || code == "AUTH_REQUIRED" => {
            "AUTH_REQUIRED: session expired; please sign in again".into()
        }
        _ => AppError::new(
            "AUTH_REQUIRED",
            format!("token refresh failed: {}", err.message()),
        ),
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("UPSTREAM_UNAVAILABLE: failed to read upstream body: {e}"))?;
    if status == StatusCode::UNAUTHORIZED {
        return Err("AUTH_REQUIRED: upstream rejected the credentials".into());
    }
    if !status.is_success() {
        return Err(AppError::upstream_status(
            status.as_u16(),
            sanitize_body_snippet(&body),
        ));
    }
    serde_json::from_str(&body).map_err(|e| {
        format!("UPSTREAM_UNAVAILABLE: upstream returned an unexpected payload: {e}").into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::settings::AppSettings;
    use crate::upstream::client::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(server: &MockServer, credentials: Credentials) -> UpstreamSession {
        let settings = AppSettings {
            auth_base_url: server.uri(),
            oauth_client_id: Some("client".to_string()),
            oauth_client_secret: Some("secret".to_string()),
            refresh_max_attempts: 1,
            ..AppSettings::default()
        };
        let http = reqwest::Client::new();
        let client = UpstreamClient::new(
            http.clone(),
            &server.uri(),
            "2025-06-26",
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
        )
        .expect("client");
        UpstreamSession::new(
            Arc::new(client),
            Arc::new(TokenManager::new(http, &settings)),
            credentials,
        )
    }

    fn oauth(access: &str, refresh: Option<&str>) -> Credentials {
        Credentials::OAuth(
            TokenPair::new(access, refresh.map(str::to_string), None).expect("pair"),
        )
    }

    #[tokio::test]
    async fn unauthorized_refreshes_once_and_retries_with_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"access_token":"fresh","expires_in":3600}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"uuid":"me"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server, oauth("stale", Some("rt")));
        let me: serde_json::Value = session.get_json("/users/me", &[]).await.expect("profile");
        assert_eq!(me["uuid"], "me");
        assert_eq!(session.token_state().await, TokenState::Valid);
        let rotated = session.rotated_tokens().await.expect("rotated");
        assert_eq!(rotated.access_token, "fresh");
        assert_eq!(rotated.refresh_token.as_deref(), Some("rt"));
    }

    #[tokio::test]
    async fn failed_refresh_surfaces_auth_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server, oauth("stale", Some("rt")));
        let err = session.get("/users/me", &[]).await.unwrap_err();
        assert_eq!(err.code(), "AUTH_REQUIRED");
        assert_eq!(session.token_state().await, TokenState::RefreshFailed);
        assert!(session.rotated_tokens().await.is_none());
    }

    #[tokio::test]
    async fn pair_without_refresh_token_is_not_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = session_for(&server, oauth("stale", None));
        let err = session.get("/users/me", &[]).await.unwrap_err();
        assert_eq!(err.code(), "AUTH_REQUIRED");
        assert_eq!(session.token_state().await, TokenState::RefreshFailed);
    }

    #[tokio::test]
    async fn api_key_unauthorized_is_returned_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server, Credentials::ApiKey("k".to_string()));
        let response = session.get("/users/me", &[]).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(session.token_state().await, TokenState::NoTokens);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_calls_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"access_token":"fresh"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let session = session_for(&server, oauth("stale", Some("rt")));
        let (a, b) = tokio::join!(
            session.get("/creators/a/followers", &[]),
            session.get("/creators/b/followers", &[])
        );
        assert_eq!(a.expect("a").status(), StatusCode::OK);
        assert_eq!(b.expect("b").status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_ok_status_becomes_pass_through_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"message":"nope"}"#))
            .mount(&server)
            .await;

        let session = session_for(&server, Credentials::ApiKey("k".to_string()));
        let err = session
            .get_json::<serde_json::Value>("/creators", &[])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_STATUS");
        assert_eq!(err.upstream_status_code(), Some(403));
    }
}
