//! Usage: Message volume of a single creator, split by fan and by day.

use crate::analytics::chats::{load_threads, ChatThread, MessageEndpoint, ThreadQuery};
use crate::analytics::dates::{day_string, DateRange};
use crate::analytics::Aggregation;
use crate::shared::error::AppResult;
use crate::upstream::models::{ChatMessage, Participant};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FanVolume {
    pub(crate) fan_uuid: String,
    pub(crate) fan_name: Option<String>,
    pub(crate) messages_sent: u32,
    pub(crate) messages_received: u32,
    pub(crate) total_messages: u32,
    pub(crate) first_message_date: String,
    pub(crate) last_message_date: String,
    pub(crate) engagement_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DailyVolume {
    pub(crate) date: String,
    pub(crate) messages_sent: u32,
    pub(crate) messages_received: u32,
    pub(crate) total_messages: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageVolumeSummary {
    pub(crate) total_chats: usize,
    pub(crate) active_fans: usize,
    pub(crate) average_messages_per_fan: f64,
    pub(crate) response_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageVolumeReport {
    pub(crate) creator_uuid: String,
    pub(crate) date_range: DateRange,
    pub(crate) total_messages_sent: u32,
    pub(crate) total_messages_received: u32,
    pub(crate) total_messages: u32,
    pub(crate) fan_engagement: Vec<FanVolume>,
    pub(crate) daily_breakdown: Vec<DailyVolume>,
    pub(crate) summary: MessageVolumeSummary,
}

fn participant_name(participant: &Participant) -> Option<String> {
    participant
        .display_name
        .clone()
        .or_else(|| participant.handle.clone())
}

/// The fan on the other side of `message`, and whether the creator sent it.
fn counterpart<'m>(
    message: &'m ChatMessage,
    creator_uuid: &str,
) -> Option<(&'m Participant, bool)> {
    let sender = message.sender.as_ref()?;
    if sender.uuid.as_deref() == Some(creator_uuid) {
        Some((message.recipient.as_ref()?, true))
    } else {
        Some((sender, false))
    }
}

/// "sent" and "received" on a fan row are from the fan's side.
pub(crate) fn build_report(
    creator_uuid: &str,
    threads: &[ChatThread],
    total_chats: usize,
    range: DateRange,
) -> MessageVolumeReport {
    let mut report = MessageVolumeReport {
        creator_uuid: creator_uuid.to_string(),
        ..MessageVolumeReport::default()
    };
    let mut fans: Vec<FanVolume> = Vec::new();
    let mut fan_index: HashMap<String, usize> = HashMap::new();
    let mut daily: BTreeMap<String, (u32, u32)> = BTreeMap::new();

    for message in threads.iter().flat_map(|thread| thread.messages.iter()) {
        let Some(ts) = message.sent() else {
            continue;
        };
        if !range.contains(ts) {
            continue;
        }
        let Some((fan, from_creator)) = counterpart(message, creator_uuid) else {
            continue;
        };
        let Some(fan_uuid) = fan.uuid.as_deref() else {
            continue;
        };
        let day = day_string(ts);

        let slot = *fan_index.entry(fan_uuid.to_string()).or_insert_with(|| {
            fans.push(FanVolume {
                fan_uuid: fan_uuid.to_string(),
                fan_name: participant_name(fan),
                messages_sent: 0,
                messages_received: 0,
                total_messages: 0,
                first_message_date: day.clone(),
                last_message_date: day.clone(),
                engagement_score: 0,
            });
            fans.len() - 1
        });
        let row = &mut fans[slot];
        if day < row.first_message_date {
            row.first_message_date = day.clone();
        }
        if day > row.last_message_date {
            row.last_message_date = day.clone();
        }

        let counts = daily.entry(day).or_insert((0, 0));
        if from_creator {
            report.total_messages_sent += 1;
            row.messages_received += 1;
            counts.0 += 1;
        } else {
            report.total_messages_received += 1;
            row.messages_sent += 1;
            counts.1 += 1;
        }
    }

    report.total_messages = report.total_messages_sent + report.total_messages_received;
    for fan in &mut fans {
        fan.total_messages = fan.messages_sent + fan.messages_received;
        fan.engagement_score = fan.total_messages;
    }
    fans.sort_by(|a, b| b.total_messages.cmp(&a.total_messages));

    report.daily_breakdown = daily
        .into_iter()
        .map(|(date, (sent, received))| DailyVolume {
            date,
            messages_sent: sent,
            messages_received: received,
            total_messages: sent + received,
        })
        .collect();

    report.summary.total_chats = total_chats;
    report.summary.active_fans = fans.len();
    if !fans.is_empty() {
        report.summary.average_messages_per_fan =
            f64::from(report.total_messages) / fans.len() as f64;
    }
    if report.total_messages_received > 0 {
        report.summary.response_rate = f64::from(report.total_messages_sent)
            / f64::from(report.total_messages_received)
            * 100.0;
    }
    report.fan_engagement = fans;
    report.date_range = range;
    report
}

/// Upstream failure on the chat listing is returned as-is; message pages are best effort.
pub(crate) async fn message_volume(
    agg: Aggregation<'_>,
    creator_uuid: &str,
    range: DateRange,
    chat_pages: u32,
) -> AppResult<MessageVolumeReport> {
    let loaded = load_threads(
        agg,
        creator_uuid,
        ThreadQuery {
            chat_query: &[],
            message_query: &[],
            chat_pages,
            endpoint: MessageEndpoint::Chat,
        },
    )
    .await?;
    Ok(build_report(creator_uuid, &loaded.threads, loaded.listed, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thread(messages: serde_json::Value) -> ChatThread {
        ChatThread {
            chat: serde_json::from_value(json!({"uuid": "chat"})).expect("chat"),
            messages: serde_json::from_value(messages).expect("messages"),
        }
    }

    fn creator_to(fan: &str, at: &str) -> serde_json::Value {
        json!({
            "sentAt": at,
            "sender": {"uuid": "me"},
            "recipient": {"uuid": fan, "handle": format!("@{fan}")}
        })
    }

    fn fan_to_creator(fan: &str, at: &str) -> serde_json::Value {
        json!({
            "sentAt": at,
            "sender": {"uuid": fan, "displayName": fan.to_uppercase()},
            "recipient": {"uuid": "me"}
        })
    }

    #[test]
    fn counts_by_fan_and_day() {
        let threads = vec![
            thread(json!([
                fan_to_creator("ann", "2025-01-02T10:00:00.000Z"),
                creator_to("ann", "2025-01-02T10:01:00.000Z"),
                fan_to_creator("ann", "2025-01-03T08:00:00.000Z"),
            ])),
            thread(json!([
                creator_to("bob", "2025-01-01T12:00:00.000Z"),
            ])),
        ];
        let range = DateRange::from_query(Some("2025-01-01"), Some("2025-01-31"));
        let report = build_report("me", &threads, 2, range);

        assert_eq!(report.total_messages_sent, 2);
        assert_eq!(report.total_messages_received, 2);
        assert_eq!(report.total_messages, 4);
        assert_eq!(report.summary.total_chats, 2);
        assert_eq!(report.summary.active_fans, 2);
        assert_eq!(report.summary.average_messages_per_fan, 2.0);
        assert_eq!(report.summary.response_rate, 100.0);

        let ann = &report.fan_engagement[0];
        assert_eq!(ann.fan_uuid, "ann");
        assert_eq!(ann.fan_name.as_deref(), Some("ANN"));
        assert_eq!(ann.messages_sent, 2);
        assert_eq!(ann.messages_received, 1);
        assert_eq!(ann.engagement_score, 3);
        assert_eq!(ann.first_message_date, "2025-01-02");
        assert_eq!(ann.last_message_date, "2025-01-03");
        assert_eq!(report.fan_engagement[1].fan_name.as_deref(), Some("@bob"));

        let days: Vec<&str> = report
            .daily_breakdown
            .iter()
            .map(|d| d.date.as_str())
            .collect();
        assert_eq!(days, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
        assert_eq!(report.daily_breakdown[1].messages_sent, 1);
        assert_eq!(report.daily_breakdown[1].messages_received, 1);
    }

    #[test]
    fn messages_outside_range_or_without_sender_are_ignored() {
        let threads = vec![thread(json!([
            fan_to_creator("ann", "2024-12-31T23:59:59.000Z"),
            {"sentAt": "2025-01-05T00:00:00.000Z"},
            {"sentAt": "not a date", "sender": {"uuid": "ann"}},
        ]))];
        let range = DateRange::from_query(Some("2025-01-01"), Some("2025-01-31"));
        let report = build_report("me", &threads, 1, range);
        assert_eq!(report.total_messages, 0);
        assert!(report.fan_engagement.is_empty());
        assert_eq!(report.summary.response_rate, 0.0);
    }
}
