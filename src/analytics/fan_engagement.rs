//! Usage: Per-fan engagement rollup across every creator's chats (fan-sent messages only).

use crate::analytics::chats::{load_threads, MessageEndpoint, ThreadQuery};
use crate::analytics::dates::DateRange;
use crate::analytics::Aggregation;
use crate::upstream::models::{ChatMessage, Creator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

const HIGH_ENGAGEMENT: u32 = 70;
const MEDIUM_ENGAGEMENT: u32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FanEngagement {
    pub(crate) fan_uuid: String,
    pub(crate) fan_name: String,
    pub(crate) total_messages: u32,
    pub(crate) messages_sent: u32,
    pub(crate) messages_received: u32,
    pub(crate) creators_engaged: Vec<String>,
    pub(crate) engagement_score: u32,
    pub(crate) first_message_date: String,
    pub(crate) last_message_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct EngagementDistribution {
    pub(crate) high: u32,
    pub(crate) medium: u32,
    pub(crate) low: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FanEngagementSummary {
    pub(crate) total_active_fans: usize,
    pub(crate) total_messages: u32,
    pub(crate) average_messages_per_fan: f64,
    pub(crate) engagement_distribution: EngagementDistribution,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FanEngagementReport {
    pub(crate) fan_engagement: Vec<FanEngagement>,
    pub(crate) summary: FanEngagementSummary,
}

pub(crate) fn engagement_score(total_messages: u32, creators: usize) -> u32 {
    let creators = u32::try_from(creators).unwrap_or(u32::MAX);
    total_messages
        .saturating_mul(2)
        .saturating_add(creators.saturating_mul(10))
        .min(100)
}

struct FanTally {
    fan_uuid: String,
    total_messages: u32,
    creators: Vec<String>,
    first: (DateTime<Utc>, String),
    last: (DateTime<Utc>, String),
}

/// Folds `(creator uuid, message)` pairs into the report. Fans keep first-seen order.
pub(crate) fn build_report<'m>(
    messages: impl IntoIterator<Item = (&'m str, &'m ChatMessage)>,
    range: &DateRange,
    min_messages: u32,
) -> FanEngagementReport {
    let mut order: Vec<FanTally> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (creator_uuid, message) in messages {
        if !message.is_from_fan() {
            continue;
        }
        let (Some(raw), Some(ts)) = (message.created_at.as_deref(), message.created()) else {
            continue;
        };
        if !range.contains(ts) {
            continue;
        }
        let fan_id = message
            .sender_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown");

        let slot = *index.entry(fan_id.to_string()).or_insert_with(|| {
            order.push(FanTally {
                fan_uuid: fan_id.to_string(),
                total_messages: 0,
                creators: Vec::new(),
                first: (ts, raw.to_string()),
                last: (ts, raw.to_string()),
            });
            order.len() - 1
        });
        let tally = &mut order[slot];
        tally.total_messages += 1;
        if !tally.creators.iter().any(|c| c == creator_uuid) {
            tally.creators.push(creator_uuid.to_string());
        }
        if ts < tally.first.0 {
            tally.first = (ts, raw.to_string());
        }
        if ts > tally.last.0 {
            tally.last = (ts, raw.to_string());
        }
    }

    let mut report = FanEngagementReport::default();
    for tally in order {
        if tally.total_messages < min_messages {
            continue;
        }
        let score = engagement_score(tally.total_messages, tally.creators.len());
        let distribution = &mut report.summary.engagement_distribution;
        if score >= HIGH_ENGAGEMENT {
            distribution.high += 1;
        } else if score >= MEDIUM_ENGAGEMENT {
            distribution.medium += 1;
        } else {
            distribution.low += 1;
        }
        report.summary.total_messages += tally.total_messages;
        report.fan_engagement.push(FanEngagement {
            fan_name: format!("Fan {}", tally.fan_uuid.chars().take(8).collect::<String>()),
            fan_uuid: tally.fan_uuid,
            total_messages: tally.total_messages,
            messages_sent: tally.total_messages,
            messages_received: 0,
            creators_engaged: tally.creators,
            engagement_score: score,
            first_message_date: tally.first.1,
            last_message_date: tally.last.1,
        });
    }

    report.summary.total_active_fans = report.fan_engagement.len();
    if report.summary.total_active_fans > 0 {
        report.summary.average_messages_per_fan =
            f64::from(report.summary.total_messages) / report.summary.total_active_fans as f64;
    }
    report
}

pub(crate) async fn fan_engagement(
    agg: Aggregation<'_>,
    creators: &[Creator],
    range: &DateRange,
    chat_pages: u32,
    min_messages: u32,
) -> FanEngagementReport {
    let threads = agg
        .fanout
        .run_best_effort("fan_engagement", creators, |creator| async move {
            load_threads(
                agg,
                &creator.uuid,
                ThreadQuery {
                    chat_query: &[],
                    message_query: &[],
                    chat_pages,
                    endpoint: MessageEndpoint::Chat,
                },
            )
            .await
        })
        .await;

    let messages = threads.iter().flat_map(|(creator, loaded)| {
        loaded.threads.iter().flat_map(move |thread| {
            thread
                .messages
                .iter()
                .map(move |message| (creator.uuid.as_str(), message))
        })
    });
    build_report(messages, range, min_messages)
}
