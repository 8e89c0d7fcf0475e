//! Usage: Message volume per creator and per fan across the first creators of the roster.

use crate::analytics::chats::{load_threads, ChatThread, MessageEndpoint, ThreadQuery};
use crate::analytics::dates::DateRange;
use crate::analytics::Aggregation;
use crate::upstream::models::{ChatMessage, Creator};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub(crate) const MAX_CREATORS: usize = 5;
const CREATOR_TIMESTAMP_LIMIT: usize = 50;
const FAN_TIMESTAMP_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageStamp {
    pub(crate) timestamp: String,
    pub(crate) date: String,
    pub(crate) time: String,
    pub(crate) sender_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) chat_id: Option<String>,
}

impl MessageStamp {
    fn new(ts: DateTime<Utc>, sender_type: Option<String>) -> Self {
        Self {
            timestamp: ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            date: ts.format("%Y-%m-%d").to_string(),
            time: ts.format("%H:%M:%S").to_string(),
            sender_type,
            message_id: None,
            chat_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HourBucket {
    pub(crate) hour: u32,
    pub(crate) count: u32,
    pub(crate) percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PeakHours {
    pub(crate) peak_hours: Vec<u32>,
    pub(crate) max_count: u32,
    pub(crate) hourly_distribution: Vec<HourBucket>,
}

/// 24-bucket UTC histogram; with no messages there is no peak.
pub(crate) fn peak_hours(timestamps: &[DateTime<Utc>]) -> PeakHours {
    let mut counts = [0u32; 24];
    for ts in timestamps {
        counts[ts.hour() as usize] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0);
    let total = timestamps.len();
    let peak_hours = if max_count == 0 {
        Vec::new()
    } else {
        (0u32..24)
            .filter(|h| counts[*h as usize] == max_count)
            .collect()
    };
    let hourly_distribution = (0u32..24)
        .map(|hour| {
            let count = counts[hour as usize];
            let percentage = if total > 0 {
                f64::from(count) / total as f64 * 100.0
            } else {
                0.0
            };
            HourBucket {
                hour,
                count,
                percentage,
            }
        })
        .collect();
    PeakHours {
        peak_hours,
        max_count,
        hourly_distribution,
    }
}

/// `min(messages*2, 100)`, plus a multi-creator bonus and an activity-rate bonus, capped at 100.
pub(crate) fn fan_activity_score(
    total_messages: u32,
    creator_count: u32,
    days_active: u32,
) -> u32 {
    let mut score = total_messages.saturating_mul(2).min(100);
    if creator_count > 1 {
        score += creator_count.saturating_mul(5).min(20);
    }
    let per_day = f64::from(total_messages) / f64::from(days_active.max(1));
    if per_day > 5.0 {
        score += 15;
    } else if per_day > 2.0 {
        score += 10;
    }
    score.min(100)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatorVolume {
    pub(crate) creator_uuid: String,
    pub(crate) creator_name: Option<String>,
    pub(crate) messages_sent: u32,
    pub(crate) messages_received: u32,
    pub(crate) total_messages: u32,
    pub(crate) fan_count: usize,
    pub(crate) peak_hours: PeakHours,
    pub(crate) message_timestamps: Vec<MessageStamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FanVolume {
    pub(crate) fan_uuid: String,
    pub(crate) fan_name: Option<String>,
    pub(crate) messages_sent: u32,
    pub(crate) messages_received: u32,
    pub(crate) total_messages: u32,
    pub(crate) creator_count: u32,
    pub(crate) engagement_score: u32,
    pub(crate) message_timestamps: Vec<MessageStamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageAnalyticsSummary {
    pub(crate) total_creators: usize,
    pub(crate) total_messages: u32,
    pub(crate) average_messages_per_creator: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageAnalyticsReport {
    pub(crate) total_messages_sent: u32,
    pub(crate) total_messages_received: u32,
    pub(crate) message_volume_by_creator: Vec<CreatorVolume>,
    pub(crate) message_volume_by_fan: Vec<FanVolume>,
    pub(crate) date_range: DateRange,
    pub(crate) summary: MessageAnalyticsSummary,
}

struct FanTally {
    fan_uuid: String,
    fan_name: Option<String>,
    messages_sent: u32,
    messages_received: u32,
    creators: Vec<String>,
    stamps: Vec<MessageStamp>,
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
}

impl FanTally {
    fn days_active(&self) -> u32 {
        match (self.first, self.last) {
            (Some(first), Some(last)) => {
                let days = (last.date_naive() - first.date_naive()).num_days() + 1;
                u32::try_from(days).unwrap_or(1).max(1)
            }
            _ => 1,
        }
    }
}

/// Fan side of a message: the sender when a fan wrote it, otherwise the receiver.
fn fan_identity(message: &ChatMessage) -> (Option<&str>, Option<&str>) {
    if message.is_from_fan() {
        (message.sender_uuid.as_deref(), message.sender_name.as_deref())
    } else {
        (
            message.receiver_uuid.as_deref(),
            message.receiver_name.as_deref(),
        )
    }
}

/// Folds the per-creator threads. `total_creators` is the full roster size.
pub(crate) fn build_report(
    per_creator: &[(&Creator, Vec<ChatThread>)],
    range: DateRange,
    total_creators: usize,
) -> MessageAnalyticsReport {
    let mut report = MessageAnalyticsReport {
        date_range: range,
        ..MessageAnalyticsReport::default()
    };
    let mut fans: Vec<FanTally> = Vec::new();
    let mut fan_index: HashMap<String, usize> = HashMap::new();

    for (creator, threads) in per_creator {
        let mut sent = 0u32;
        let mut received = 0u32;
        let mut creator_fans: Vec<&str> = Vec::new();
        let mut stamps: Vec<MessageStamp> = Vec::new();
        let mut hours: Vec<DateTime<Utc>> = Vec::new();

        for thread in threads {
            for message in &thread.messages {
                match message.sender_type.as_deref() {
                    Some("creator") => sent += 1,
                    Some("fan") => received += 1,
                    _ => {}
                }
                let ts = message.created();
                if let Some(ts) = ts {
                    hours.push(ts);
                    let mut stamp = MessageStamp::new(ts, message.sender_type.clone());
                    stamp.message_id = message.uuid.clone();
                    stamp.chat_id = Some(thread.chat.uuid.clone());
                    stamps.push(stamp);
                }

                let (Some(fan_uuid), fan_name) = fan_identity(message) else {
                    continue;
                };
                if !creator_fans.contains(&fan_uuid) {
                    creator_fans.push(fan_uuid);
                }
                let slot = *fan_index.entry(fan_uuid.to_string()).or_insert_with(|| {
                    fans.push(FanTally {
                        fan_uuid: fan_uuid.to_string(),
                        fan_name: fan_name.map(str::to_string),
                        messages_sent: 0,
                        messages_received: 0,
                        creators: Vec::new(),
                        stamps: Vec::new(),
                        first: None,
                        last: None,
                    });
                    fans.len() - 1
                });
                let fan = &mut fans[slot];
                if message.is_from_fan() {
                    fan.messages_sent += 1;
                } else {
                    fan.messages_received += 1;
                }
                if !fan.creators.iter().any(|c| *c == creator.uuid) {
                    fan.creators.push(creator.uuid.clone());
                }
                if let Some(ts) = ts {
                    fan.stamps
                        .push(MessageStamp::new(ts, message.sender_type.clone()));
                    fan.first = Some(fan.first.map_or(ts, |f| f.min(ts)));
                    fan.last = Some(fan.last.map_or(ts, |l| l.max(ts)));
                }
            }
        }

        let total = sent + received;
        report.total_messages_sent += sent;
        report.total_messages_received += received;
        report.summary.total_messages += total;
        stamps.truncate(CREATOR_TIMESTAMP_LIMIT);
        report.message_volume_by_creator.push(CreatorVolume {
            creator_uuid: creator.uuid.clone(),
            creator_name: creator.label().map(str::to_string),
            messages_sent: sent,
            messages_received: received,
            total_messages: total,
            fan_count: creator_fans.len(),
            peak_hours: peak_hours(&hours),
            message_timestamps: stamps,
        });
    }

    report.message_volume_by_fan = fans
        .into_iter()
        .map(|mut fan| {
            let total = fan.messages_sent + fan.messages_received;
            let creator_count = u32::try_from(fan.creators.len()).unwrap_or(u32::MAX);
            let score = fan_activity_score(total, creator_count, fan.days_active());
            fan.stamps.truncate(FAN_TIMESTAMP_LIMIT);
            FanVolume {
                fan_uuid: fan.fan_uuid,
                fan_name: fan.fan_name,
                messages_sent: fan.messages_sent,
                messages_received: fan.messages_received,
                total_messages: total,
                creator_count,
                engagement_score: score,
                message_timestamps: fan.stamps,
            }
        })
        .collect();

    report.summary.total_creators = total_creators;
    if total_creators > 0 {
        report.summary.average_messages_per_creator =
            f64::from(report.summary.total_messages) / total_creators as f64;
    }
    report
}

pub(crate) async fn message_analytics(
    agg: Aggregation<'_>,
    creators: &[Creator],
    range: DateRange,
    chat_pages: u32,
) -> MessageAnalyticsReport {
    let selected = &creators[..creators.len().min(MAX_CREATORS)];
    let query = range.query_pairs();
    let per_creator = agg
        .fanout
        .run_best_effort("message_analytics", selected, |creator| {
            let query = &query;
            async move {
                load_threads(
                    agg,
                    &creator.uuid,
                    ThreadQuery {
                        chat_query: query,
                        message_query: query,
                        chat_pages,
                        endpoint: MessageEndpoint::CreatorChat,
                    },
                )
                .await
                .map(|loaded| loaded.threads)
            }
        })
        .await;
    build_report(&per_creator, range, creators.len())
}
