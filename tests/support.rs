#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use fanvue_agency_hub_lib::test_support;
use fanvue_agency_hub_lib::AppSettings;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

pub struct TestApp {
    pub server: MockServer,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// Value of the `Set-Cookie` entry named `name`, if one was sent.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.set_cookies().into_iter().find_map(|raw| {
            raw.strip_prefix(&prefix)
                .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        })
    }
}

impl TestApp {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut AppSettings)) -> Self {
        let server = MockServer::start().await;
        let mut settings = test_support::settings_for(&server.uri());
        customize(&mut settings);
        let router = test_support::router(settings).expect("router");
        Self { server, router }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_with_cookies(uri, None).await
    }

    pub async fn get_with_cookies(&self, uri: &str, cookies: Option<&str>) -> TestResponse {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}
