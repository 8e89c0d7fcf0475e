//! Usage: Single-call pass-through routes; the upstream JSON is returned as-is.

use crate::analytics::dates::DateRange;
use crate::gateway::handlers::{dashboard_session, respond};
use crate::gateway::query::{positive_or, PageQuery};
use crate::gateway::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

const CREATORS_DEFAULT_SIZE: u32 = 15;
const LIST_DEFAULT_SIZE: u32 = 50;

async fn forward(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    query: Vec<(&'static str, String)>,
) -> Response {
    let session = match dashboard_session(state, headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let result = session.get_json::<Value>(path, &query).await;
    respond(state, &session, result).await
}

fn page_pairs(q: &PageQuery, default_size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", positive_or(q.page.as_deref(), 1).to_string()),
        ("size", positive_or(q.size.as_deref(), default_size).to_string()),
    ]
}

pub(crate) async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    forward(&state, &headers, "/users/me", Vec::new()).await
}

pub(crate) async fn creators(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Response {
    forward(&state, &headers, "/creators", page_pairs(&q, CREATORS_DEFAULT_SIZE)).await
}

pub(crate) async fn subscribers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Response {
    forward(&state, &headers, "/subscribers", page_pairs(&q, LIST_DEFAULT_SIZE)).await
}

pub(crate) async fn earnings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Response {
    let mut query =
        DateRange::from_query(q.start_date.as_deref(), q.end_date.as_deref()).query_pairs();
    if let Some(cursor) = q.cursor.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        query.push(("cursor", cursor.to_string()));
    }
    query.push(("size", positive_or(q.size.as_deref(), LIST_DEFAULT_SIZE).to_string()));
    forward(&state, &headers, "/insights/earnings", query).await
}
