use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::handlers::{aggregate, auth, creator, debug, passthrough, powerbi};
use super::state::AppState;
use crate::shared::time::now_unix_seconds;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app: &'static str,
    version: &'static str,
    ts: i64,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app: "fanvue-agency-hub",
        version: env!("CARGO_PKG_VERSION"),
        ts: now_unix_seconds(),
    })
}

async fn root() -> &'static str {
    "Fanvue Agency Hub is running"
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/authorize", get(auth::authorize))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/logout", get(auth::logout).post(auth::logout))
        .route("/api/profile", get(passthrough::profile))
        .route("/api/creators", get(passthrough::creators))
        .route("/api/earnings", get(passthrough::earnings))
        .route("/api/subscribers", get(passthrough::subscribers))
        .route("/api/creators/:uuid/earnings", get(creator::earnings))
        .route("/api/creators/:uuid/followers", get(creator::followers))
        .route("/api/creators/:uuid/subscribers", get(creator::subscribers))
        .route(
            "/api/creators/:uuid/message-volume",
            get(creator::message_volume),
        )
        .route("/api/all-earnings", get(aggregate::all_earnings))
        .route("/api/all-followers", get(aggregate::all_followers))
        .route("/api/all-subscribers", get(aggregate::all_subscribers))
        .route("/api/fan-engagement", get(aggregate::fan_engagement))
        .route("/api/message-analytics", get(aggregate::message_analytics))
        .route(
            "/api/powerbi/creators-summary",
            get(powerbi::hybrid_creators_summary),
        )
        .route(
            "/api/powerbi/earnings-detail",
            get(powerbi::hybrid_earnings_detail),
        )
        .route(
            "/api/powerbi/service/creators-summary",
            get(powerbi::service_creators_summary),
        )
        .route(
            "/api/powerbi/service/earnings-detail",
            get(powerbi::service_earnings_detail),
        )
        .route(
            "/api/powerbi/public/creators-summary",
            get(powerbi::public_creators_summary),
        )
        .route(
            "/api/powerbi/public/earnings-detail",
            get(powerbi::public_earnings_detail),
        )
        .route("/api/debug/auth", get(debug::auth))
        .route("/api/debug/env", get(debug::env))
        .with_state(state)
}
