//! Usage: Flat per-creator record lists (earnings, followers, subscribers) merged across creators.

use crate::analytics::dates::DateRange;
use crate::analytics::{Aggregation, RECORDS_PAGE_SIZE};
use crate::upstream::models::{Creator, CreatorScoped, EarningsItem, FanRecord};
use crate::upstream::pagination::PageRequest;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CreatorResource {
    Earnings,
    Followers,
    Subscribers,
}

impl CreatorResource {
    pub(crate) fn path(self, creator_uuid: &str) -> String {
        match self {
            CreatorResource::Earnings => format!("/creators/{creator_uuid}/insights/earnings"),
            CreatorResource::Followers => format!("/creators/{creator_uuid}/followers"),
            CreatorResource::Subscribers => format!("/creators/{creator_uuid}/subscribers"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            CreatorResource::Earnings => "earnings",
            CreatorResource::Followers => "followers",
            CreatorResource::Subscribers => "subscribers",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FlatAggregate<T> {
    pub(crate) data: Vec<CreatorScoped<T>>,
    pub(crate) total_records: usize,
    pub(crate) creators_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) date_range: Option<DateRange>,
}

async fn collect_flat<T: DeserializeOwned>(
    agg: Aggregation<'_>,
    creators: &[Creator],
    resource: CreatorResource,
    range: &DateRange,
    max_pages: u32,
) -> Vec<CreatorScoped<T>> {
    let paginator = agg.paginator();
    let query = range.query_pairs();
    let per_creator = agg
        .fanout
        .run_best_effort(resource.label(), creators, |creator| {
            let path = resource.path(&creator.uuid);
            let query = query.clone();
            async move {
                paginator
                    .collect::<T>(&path, &query, PageRequest::pages(RECORDS_PAGE_SIZE, max_pages))
                    .await
            }
        })
        .await;

    let mut data = Vec::new();
    for (creator, result) in per_creator {
        tracing::debug!(
            creator_uuid = %creator.uuid,
            resource = resource.label(),
            records = result.total_count(),
            pages = result.pages_fetched,
            "creator records collected"
        );
        data.extend(
            result
                .records
                .into_iter()
                .map(|record| CreatorScoped::new(creator, record)),
        );
    }
    data
}

pub(crate) async fn all_earnings(
    agg: Aggregation<'_>,
    creators: &[Creator],
    range: DateRange,
    max_pages: u32,
) -> FlatAggregate<EarningsItem> {
    let data = collect_flat(agg, creators, CreatorResource::Earnings, &range, max_pages).await;
    FlatAggregate {
        total_records: data.len(),
        creators_processed: creators.len(),
        data,
        date_range: Some(range),
    }
}

/// Followers or subscribers; these lists ignore date ranges.
pub(crate) async fn all_fans(
    agg: Aggregation<'_>,
    creators: &[Creator],
    resource: CreatorResource,
    max_pages: u32,
) -> FlatAggregate<FanRecord> {
    let data = collect_flat(agg, creators, resource, &DateRange::default(), max_pages).await;
    FlatAggregate {
        total_records: data.len(),
        creators_processed: creators.len(),
        data,
        date_range: None,
    }
}
