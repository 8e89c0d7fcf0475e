//! Usage: Flat, Power BI friendly feeds (creator summary and earnings detail rows).

use crate::analytics::creators::{list_creators, Roster};
use crate::analytics::dates::{
    day_string, parse_calendar_date, DateParts, DateRange, DEFAULT_WINDOW_DAYS,
};
use crate::analytics::{Aggregation, RECORDS_PAGE_SIZE};
use crate::shared::error::{AppError, AppResult};
use crate::shared::time::now_iso8601;
use crate::upstream::models::{Creator, EarningsItem, FanRecord};
use crate::upstream::pagination::PageRequest;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub(crate) const FEED_API_VERSION: &str = "1.0";
pub(crate) const EARNINGS_MAX_PAGES: u32 = 3;
const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_HANDLE: &str = "unknown";
const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum Authentication {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "oauth")]
    OAuth,
    #[serde(rename = "service-account")]
    ServiceAccount,
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum DataSource {
    #[serde(rename = "real")]
    Live,
    #[serde(rename = "mock")]
    Mock,
}

/// Calendar window of a feed; metadata echoes the bare days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeedWindow {
    pub(crate) start_date: String,
    pub(crate) end_date: String,
}

impl FeedWindow {
    pub(crate) fn from_query(start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Self {
        let pick = |value: Option<&str>, fallback: DateTime<Utc>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| day_string(fallback))
        };
        Self {
            start_date: pick(start, now - Duration::days(DEFAULT_WINDOW_DAYS)),
            end_date: pick(end, now),
        }
    }

    pub(crate) fn range(&self) -> DateRange {
        DateRange::from_query(Some(&self.start_date), Some(&self.end_date))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedMetadata {
    pub(crate) generated_at: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) total_creators: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) total_transactions: Option<usize>,
    pub(crate) api_version: &'static str,
    pub(crate) authentication: Authentication,
    pub(crate) data_source: DataSource,
}

impl FeedMetadata {
    pub(crate) fn new(
        window: &FeedWindow,
        authentication: Authentication,
        data_source: DataSource,
    ) -> Self {
        Self {
            generated_at: now_iso8601(),
            start_date: window.start_date.clone(),
            end_date: window.end_date.clone(),
            total_creators: 0,
            total_transactions: None,
            api_version: FEED_API_VERSION,
            authentication,
            data_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Feed<T> {
    pub(crate) metadata: FeedMetadata,
    pub(crate) data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatorSummaryRow {
    pub(crate) creator_id: String,
    pub(crate) creator_name: String,
    pub(crate) creator_handle: String,
    pub(crate) total_revenue: f64,
    pub(crate) total_transactions: usize,
    pub(crate) total_followers: usize,
    pub(crate) total_subscribers: usize,
    pub(crate) avg_transaction_value: f64,
    pub(crate) last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarningsRow {
    pub(crate) transaction_id: String,
    pub(crate) creator_id: String,
    pub(crate) creator_name: String,
    pub(crate) creator_handle: String,
    pub(crate) date: String,
    pub(crate) gross_amount: f64,
    pub(crate) net_amount: f64,
    pub(crate) source: String,
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) day: u32,
    pub(crate) day_of_week: u32,
    pub(crate) week_of_year: u32,
    pub(crate) quarter: u32,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn cents_to_dollars(cents: Option<f64>) -> f64 {
    cents.unwrap_or(0.0) / 100.0
}

struct CreatorIdentity {
    id: String,
    name: String,
    handle: String,
}

impl CreatorIdentity {
    fn of(creator: &Creator) -> Self {
        Self {
            id: creator.uuid.clone(),
            name: creator
                .display_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            handle: creator
                .handle
                .clone()
                .unwrap_or_else(|| UNKNOWN_HANDLE.to_string()),
        }
    }
}

pub(crate) fn summary_row(
    creator: &Creator,
    earnings: &[EarningsItem],
    followers: usize,
    subscribers: usize,
) -> CreatorSummaryRow {
    let identity = CreatorIdentity::of(creator);
    let revenue: f64 = earnings.iter().map(|item| cents_to_dollars(item.net)).sum();
    let transactions = earnings.len();
    let average = if transactions > 0 {
        revenue / transactions as f64
    } else {
        0.0
    };
    CreatorSummaryRow {
        creator_id: identity.id,
        creator_name: identity.name,
        creator_handle: identity.handle,
        total_revenue: round2(revenue),
        total_transactions: transactions,
        total_followers: followers,
        total_subscribers: subscribers,
        avg_transaction_value: round2(average),
        last_updated: now_iso8601(),
    }
}

/// Items whose `date` cannot be read as a calendar date produce no row.
pub(crate) fn earnings_rows(creator: &Creator, earnings: &[EarningsItem]) -> Vec<EarningsRow> {
    let identity = CreatorIdentity::of(creator);
    earnings
        .iter()
        .filter_map(|item| {
            let raw = item.date.as_deref()?;
            let Some(date) = parse_calendar_date(raw) else {
                tracing::debug!(
                    creator_uuid = %identity.id,
                    date = raw,
                    "earnings row skipped: unreadable date"
                );
                return None;
            };
            let parts = DateParts::of(date);
            Some(EarningsRow {
                transaction_id: format!("{}-{raw}", identity.id),
                creator_id: identity.id.clone(),
                creator_name: identity.name.clone(),
                creator_handle: identity.handle.clone(),
                date: raw.to_string(),
                gross_amount: cents_to_dollars(item.gross),
                net_amount: cents_to_dollars(item.net),
                source: item
                    .source
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                year: parts.year,
                month: parts.month,
                day: parts.day,
                day_of_week: parts.day_of_week,
                week_of_year: parts.iso_week,
                quarter: parts.quarter,
            })
        })
        .collect()
}

fn agency_path(creator_uuid: &str, resource: &str) -> String {
    format!("/agencies/creators/{creator_uuid}/{resource}")
}

/// Cursor-paged earnings; a failed page keeps what was collected before it.
async fn agency_earnings(
    agg: Aggregation<'_>,
    creator_uuid: &str,
    range: &DateRange,
) -> AppResult<Vec<EarningsItem>> {
    let result = agg
        .paginator()
        .collect::<EarningsItem>(
            &agency_path(creator_uuid, "insights/earnings"),
            &range.query_pairs(),
            PageRequest::cursor(RECORDS_PAGE_SIZE, EARNINGS_MAX_PAGES),
        )
        .await?;
    if let Some(halted) = &result.halted {
        tracing::warn!(
            creator_uuid = %creator_uuid,
            status = halted.status,
            pages = result.pages_fetched,
            "earnings pagination halted"
        );
    }
    Ok(result.records)
}

/// Size of the first page; any failure counts as zero.
async fn agency_count(agg: Aggregation<'_>, creator_uuid: &str, resource: &str) -> usize {
    match agg
        .paginator()
        .collect::<FanRecord>(
            &agency_path(creator_uuid, resource),
            &[],
            PageRequest::pages(RECORDS_PAGE_SIZE, 1),
        )
        .await
    {
        Ok(result) => result.total_count(),
        Err(err) => {
            tracing::warn!(
                creator_uuid = %creator_uuid,
                resource,
                code = %err.code(),
                "count unavailable: {}",
                err.message()
            );
            0
        }
    }
}

pub(crate) async fn creators_summary(
    agg: Aggregation<'_>,
    window: &FeedWindow,
    authentication: Authentication,
) -> AppResult<Feed<CreatorSummaryRow>> {
    let creators = list_creators(agg.session, Roster::Agency).await?;
    let range = window.range();
    let rows = agg
        .fanout
        .run(&creators, |creator| {
            let range = &range;
            async move {
                let (earnings, followers, subscribers) = tokio::join!(
                    agency_earnings(agg, &creator.uuid, range),
                    agency_count(agg, &creator.uuid, "followers"),
                    agency_count(agg, &creator.uuid, "subscribers"),
                );
                let earnings = earnings.unwrap_or_else(|err| {
                    tracing::warn!(
                        creator_uuid = %creator.uuid,
                        code = %err.code(),
                        "earnings unavailable: {}",
                        err.message()
                    );
                    Vec::new()
                });
                Ok::<_, AppError>(summary_row(creator, &earnings, followers, subscribers))
            }
        })
        .await;

    let data: Vec<CreatorSummaryRow> = rows
        .into_iter()
        .filter_map(|(_, row)| row.ok())
        .collect();
    let mut metadata = FeedMetadata::new(window, authentication, DataSource::Live);
    metadata.total_creators = data.len();
    Ok(Feed { metadata, data })
}

/// With `creator_id` set the roster is skipped and only that creator is read.
pub(crate) async fn earnings_detail(
    agg: Aggregation<'_>,
    window: &FeedWindow,
    creator_id: Option<&str>,
    authentication: Authentication,
) -> AppResult<Feed<EarningsRow>> {
    let creators = match creator_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => vec![Creator {
            uuid: id.to_string(),
            name: None,
            display_name: Some("Filtered Creator".to_string()),
            handle: Some("filtered".to_string()),
            extra: Default::default(),
        }],
        None => list_creators(agg.session, Roster::Agency).await?,
    };
    let range = window.range();
    let per_creator = agg
        .fanout
        .run_best_effort("powerbi_earnings", &creators, |creator| {
            let range = &range;
            async move { agency_earnings(agg, &creator.uuid, range).await }
        })
        .await;

    let data: Vec<EarningsRow> = per_creator
        .iter()
        .flat_map(|(creator, earnings)| earnings_rows(creator, earnings))
        .collect();
    let mut metadata = FeedMetadata::new(window, authentication, DataSource::Live);
    metadata.total_creators = creators.len();
    metadata.total_transactions = Some(data.len());
    Ok(Feed { metadata, data })
}
