//! Usage: Per-creator routes (earnings, followers, subscribers, message volume).

use crate::analytics::dates::{DateRange, DEFAULT_WINDOW_DAYS};
use crate::analytics::flat::CreatorResource;
use crate::analytics::message_volume::{message_volume as volume_report, MessageVolumeReport};
use crate::analytics::{DEFAULT_MAX_PAGES, RECORDS_PAGE_SIZE};
use crate::gateway::handlers::{dashboard_session, path_id, respond};
use crate::gateway::query::{positive_or, PageQuery, RangeQuery};
use crate::gateway::state::AppState;
use crate::shared::error::AppResult;
use crate::upstream::models::{EarningsItem, FanRecord};
use crate::upstream::pagination::{AggregateResult, PageRequest, Paginator};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

const FAN_LIST_DEFAULT_PAGES: u32 = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatorEarnings {
    data: Vec<EarningsItem>,
    total_count: usize,
    has_more: bool,
    pages_fetched: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FanListPagination {
    page: u32,
    size: usize,
    has_more: bool,
    pages_fetched: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatorFanList {
    data: Vec<FanRecord>,
    pagination: FanListPagination,
}

async fn collect_earnings(
    paginator: Paginator<'_>,
    creator_uuid: &str,
    range: &DateRange,
    max_pages: u32,
) -> AppResult<CreatorEarnings> {
    let result = paginator
        .collect::<EarningsItem>(
            &CreatorResource::Earnings.path(creator_uuid),
            &range.query_pairs(),
            PageRequest::cursor(RECORDS_PAGE_SIZE, max_pages),
        )
        .await?;
    if let Some(err) = result.first_page_error() {
        return Err(err);
    }
    Ok(CreatorEarnings {
        total_count: result.total_count(),
        has_more: result.has_more,
        pages_fetched: result.pages_fetched,
        data: result.records,
    })
}

fn agency_fan_path(resource: CreatorResource, creator_uuid: &str) -> String {
    format!("/agencies{}", resource.path(creator_uuid))
}

/// Agency endpoint first; a 403/404 on its first page falls back to the creator endpoint.
async fn collect_fans(
    paginator: Paginator<'_>,
    creator_uuid: &str,
    resource: CreatorResource,
    max_pages: u32,
) -> AppResult<CreatorFanList> {
    let request = PageRequest::pages(RECORDS_PAGE_SIZE, max_pages);
    let mut result: AggregateResult<FanRecord> = paginator
        .collect(&agency_fan_path(resource, creator_uuid), &[], request.clone())
        .await?;
    let fallback = result.pages_fetched == 0
        && matches!(result.halted.as_ref().map(|h| h.status), Some(403 | 404));
    if fallback {
        tracing::info!(
            creator_uuid = %creator_uuid,
            status = result.halted.as_ref().map(|h| h.status),
            "agency endpoint refused; using creator endpoint"
        );
        result = paginator
            .collect(&resource.path(creator_uuid), &[], request)
            .await?;
    }
    if let Some(err) = result.first_page_error() {
        return Err(err);
    }
    Ok(CreatorFanList {
        pagination: FanListPagination {
            page: 1,
            size: result.total_count(),
            has_more: result.has_more,
            pages_fetched: result.pages_fetched,
        },
        data: result.records,
    })
}

pub(crate) async fn earnings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(creator_uuid): Path<String>,
    Query(q): Query<PageQuery>,
) -> Response {
    let creator_uuid = match path_id(&creator_uuid) {
        Ok(id) => id.to_string(),
        Err(err) => return err.into_response(),
    };
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let agg = state.aggregation(&session);
    let range = DateRange::from_query(q.start_date.as_deref(), q.end_date.as_deref());
    let max_pages = positive_or(q.max_pages.as_deref(), DEFAULT_MAX_PAGES);
    let result = collect_earnings(agg.paginator(), &creator_uuid, &range, max_pages).await;
    respond(&state, &session, result).await
}

async fn fan_list(
    state: AppState,
    headers: HeaderMap,
    creator_uuid: String,
    q: PageQuery,
    resource: CreatorResource,
) -> Response {
    let creator_uuid = match path_id(&creator_uuid) {
        Ok(id) => id.to_string(),
        Err(err) => return err.into_response(),
    };
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let agg = state.aggregation(&session);
    let max_pages = positive_or(q.max_pages.as_deref(), FAN_LIST_DEFAULT_PAGES);
    let result = collect_fans(agg.paginator(), &creator_uuid, resource, max_pages).await;
    respond(&state, &session, result).await
}

pub(crate) async fn followers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(creator_uuid): Path<String>,
    Query(q): Query<PageQuery>,
) -> Response {
    fan_list(state, headers, creator_uuid, q, CreatorResource::Followers).await
}

pub(crate) async fn subscribers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(creator_uuid): Path<String>,
    Query(q): Query<PageQuery>,
) -> Response {
    fan_list(state, headers, creator_uuid, q, CreatorResource::Subscribers).await
}

pub(crate) async fn message_volume(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(creator_uuid): Path<String>,
    Query(q): Query<RangeQuery>,
) -> Response {
    let creator_uuid = match path_id(&creator_uuid) {
        Ok(id) => id.to_string(),
        Err(err) => return err.into_response(),
    };
    let session = match dashboard_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };
    let range = DateRange::with_default_window(
        q.start_date.as_deref(),
        q.end_date.as_deref(),
        DEFAULT_WINDOW_DAYS,
        Utc::now(),
    );
    let chat_pages = positive_or(q.max_pages.as_deref(), DEFAULT_MAX_PAGES);
    let result: AppResult<MessageVolumeReport> =
        volume_report(state.aggregation(&session), &creator_uuid, range, chat_pages).await;
    respond(&state, &session, result).await
}
