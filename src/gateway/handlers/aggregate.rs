//! Usage: Cross-creator aggregate routes.

use crate::analytics::creators::{list_creators, Roster};
use crate::analytics::dates::{day_string, DateRange, DEFAULT_WINDOW_DAYS};
use crate::analytics::fan_engagement::fan_engagement as engagement_report;
use crate::analytics::flat::{all_earnings as earnings_aggregate, all_fans, CreatorResource};
use crate::analytics::message_analytics::message_analytics as analytics_report;
use crate::analytics::DEFAULT_MAX_PAGES;
use crate::gateway::handlers::{dashboard_session, respond};
use crate::gateway::query::{count_or, positive_or, RangeQuery};
use crate::gateway::state::AppState;
use crate::shared::error::AppError;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

const ENGAGEMENT_DEFAULT_START: &str = "2025-01-01";
const CHAT_DEFAULT_PAGES: u32 = 3;
const ENGAGEMENT_DEFAULT_MIN_MESSAGES: u32 = 1;

pub(crate) async fn all_earnings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<RangeQuery>,
) -> Response {
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let agg = state.aggregation(&session);
    let range = DateRange::from_query(q.start_date.as_deref(), q.end_date.as_deref());
    let max_pages = positive_or(q.max_pages.as_deref(), DEFAULT_MAX_PAGES);
    let result = async {
        let creators = list_creators(&session, Roster::Creators).await?;
        Ok::<_, AppError>(earnings_aggregate(agg, &creators, range, max_pages).await)
    }
    .await;
    respond(&state, &session, result).await
}

async fn fans(
    state: AppState,
    headers: HeaderMap,
    q: RangeQuery,
    resource: CreatorResource,
) -> Response {
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let agg = state.aggregation(&session);
    let max_pages = positive_or(q.max_pages.as_deref(), DEFAULT_MAX_PAGES);
    let result = async {
        let creators = list_creators(&session, Roster::Creators).await?;
        Ok::<_, AppError>(all_fans(agg, &creators, resource, max_pages).await)
    }
    .await;
    respond(&state, &session, result).await
}

pub(crate) async fn all_followers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<RangeQuery>,
) -> Response {
    fans(state, headers, q, CreatorResource::Followers).await
}

pub(crate) async fn all_subscribers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<RangeQuery>,
) -> Response {
    fans(state, headers, q, CreatorResource::Subscribers).await
}

pub(crate) async fn fan_engagement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<RangeQuery>,
) -> Response {
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let agg = state.aggregation(&session);
    let today = day_string(Utc::now());
    let range = DateRange::from_query(
        Some(q.start_date.as_deref().unwrap_or(ENGAGEMENT_DEFAULT_START)),
        Some(q.end_date.as_deref().unwrap_or(&today)),
    );
    let chat_pages = positive_or(q.max_pages.as_deref(), CHAT_DEFAULT_PAGES);
    let min_messages = count_or(q.min_messages.as_deref(), ENGAGEMENT_DEFAULT_MIN_MESSAGES);
    let result = async {
        let creators = list_creators(&session, Roster::Creators).await?;
        Ok::<_, AppError>(engagement_report(agg, &creators, &range, chat_pages, min_messages).await)
    }
    .await;
    respond(&state, &session, result).await
}

pub(crate) async fn message_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<RangeQuery>,
) -> Response {
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let agg = state.aggregation(&session);
    let range = DateRange::with_default_window(
        q.start_date.as_deref(),
        q.end_date.as_deref(),
        DEFAULT_WINDOW_DAYS,
        Utc::now(),
    );
    let chat_pages = positive_or(q.max_pages.as_deref(), CHAT_DEFAULT_PAGES);
    let result = async {
        let creators = list_creators(&session, Roster::Creators).await?;
        Ok::<_, AppError>(analytics_report(agg, &creators, range, chat_pages).await)
    }
    .await;
    respond(&state, &session, result).await
}
