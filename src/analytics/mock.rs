//! Usage: Demonstration Power BI feeds that never touch the upstream API.

use crate::analytics::dates::DateParts;
use crate::analytics::powerbi::{
    round2, Authentication, CreatorSummaryRow, DataSource, EarningsRow, Feed, FeedMetadata,
    FeedWindow,
};
use crate::shared::time::now_iso8601;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

const PLATFORM_SHARE: f64 = 0.85;
const SOURCES: [&str; 5] = ["subscription", "tip", "message", "content", "premium"];

struct DemoCreator {
    id: &'static str,
    name: &'static str,
    handle: &'static str,
    revenue: f64,
    transactions: usize,
    followers: usize,
    subscribers: usize,
    average: f64,
}

const DEMO_CREATORS: [DemoCreator; 5] = [
    DemoCreator {
        id: "e507b598-4347-4ea5-b27d-4367ea351ab9",
        name: "Ellie May",
        handle: "ellalxox",
        revenue: 3904.44,
        transactions: 150,
        followers: 1234,
        subscribers: 567,
        average: 26.03,
    },
    DemoCreator {
        id: "a1b2c3d4-e5f6-7890-abcd-ef1234567890",
        name: "Carys",
        handle: "carys_official",
        revenue: 1213.87,
        transactions: 89,
        followers: 892,
        subscribers: 234,
        average: 13.64,
    },
    DemoCreator {
        id: "b2c3d4e5-f6a7-8901-bcde-f23456789012",
        name: "Léo",
        handle: "leo_creator",
        revenue: 819.01,
        transactions: 45,
        followers: 2341,
        subscribers: 123,
        average: 18.20,
    },
    DemoCreator {
        id: "c3d4e5f6-a7b8-9012-cdef-345678901234",
        name: "Molly",
        handle: "molly_vip",
        revenue: 2567.33,
        transactions: 78,
        followers: 1567,
        subscribers: 445,
        average: 32.91,
    },
    DemoCreator {
        id: "d4e5f6a7-b8c9-0123-def0-456789012345",
        name: "Sophia",
        handle: "sophia_premium",
        revenue: 1892.15,
        transactions: 112,
        followers: 987,
        subscribers: 298,
        average: 16.89,
    },
];

pub(crate) fn creators_summary(window: &FeedWindow) -> Feed<CreatorSummaryRow> {
    let last_updated = now_iso8601();
    let data: Vec<CreatorSummaryRow> = DEMO_CREATORS
        .iter()
        .map(|c| CreatorSummaryRow {
            creator_id: c.id.to_string(),
            creator_name: c.name.to_string(),
            creator_handle: c.handle.to_string(),
            total_revenue: c.revenue,
            total_transactions: c.transactions,
            total_followers: c.followers,
            total_subscribers: c.subscribers,
            avg_transaction_value: c.average,
            last_updated: last_updated.clone(),
        })
        .collect();
    let mut metadata = FeedMetadata::new(window, Authentication::None, DataSource::Mock);
    metadata.total_creators = data.len();
    Feed { metadata, data }
}

/// 5 to 15 random transactions per demo creator, dated within the last 30 days.
pub(crate) fn earnings_detail(
    window: &FeedWindow,
    creator_id: Option<&str>,
    now: DateTime<Utc>,
) -> Feed<EarningsRow> {
    let mut rng = rand::thread_rng();
    let targets: Vec<&DemoCreator> = DEMO_CREATORS
        .iter()
        .filter(|c| creator_id.map_or(true, |id| c.id == id))
        .collect();

    let mut data = Vec::new();
    for creator in &targets {
        let count = rng.gen_range(5..=15);
        for i in 0..count {
            let at = now - Duration::days(rng.gen_range(0..30));
            let gross = rng.gen_range(10.0..110.0);
            let source = SOURCES.choose(&mut rng).copied().unwrap_or(SOURCES[0]);
            let parts = DateParts::of(at.date_naive());
            data.push(EarningsRow {
                transaction_id: format!("{}-{}-{i}", creator.id, at.timestamp_millis()),
                creator_id: creator.id.to_string(),
                creator_name: creator.name.to_string(),
                creator_handle: creator.handle.to_string(),
                date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
                gross_amount: round2(gross),
                net_amount: round2(gross * PLATFORM_SHARE),
                source: source.to_string(),
                year: parts.year,
                month: parts.month,
                day: parts.day,
                day_of_week: parts.day_of_week,
                week_of_year: parts.iso_week,
                quarter: parts.quarter,
            });
        }
    }

    let mut metadata = FeedMetadata::new(window, Authentication::None, DataSource::Mock);
    metadata.total_creators = targets.len();
    metadata.total_transactions = Some(data.len());
    Feed { metadata, data }
}
