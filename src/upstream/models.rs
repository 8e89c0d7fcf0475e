//! Usage: Typed Fanvue records. Known fields are typed; everything else is carried verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Creator {
    pub(crate) uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) handle: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Creator {
    pub(crate) fn label(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.name.as_deref())
    }
}

/// Earnings amounts are integer cents upstream; kept as `f64` to tolerate decimal payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarningsItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) gross: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) net: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) source: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

/// Follower and subscriber entries share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FanRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) uuid: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Chat {
    pub(crate) uuid: String,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Participant {
    #[serde(default)]
    pub(crate) uuid: Option<String>,
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) handle: Option<String>,
}

/// Message payloads differ by endpoint: agency chat listings use `createdAt` + `senderType`,
/// creator chat listings use `sentAt` + `sender`/`recipient` objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatMessage {
    #[serde(default)]
    pub(crate) uuid: Option<String>,
    #[serde(default)]
    pub(crate) created_at: Option<String>,
    #[serde(default)]
    pub(crate) sent_at: Option<String>,
    #[serde(default)]
    pub(crate) sender_type: Option<String>,
    #[serde(default)]
    pub(crate) sender_id: Option<String>,
    #[serde(default)]
    pub(crate) sender_uuid: Option<String>,
    #[serde(default)]
    pub(crate) sender_name: Option<String>,
    #[serde(default)]
    pub(crate) receiver_uuid: Option<String>,
    #[serde(default)]
    pub(crate) receiver_name: Option<String>,
    #[serde(default)]
    pub(crate) sender: Option<Participant>,
    #[serde(default)]
    pub(crate) recipient: Option<Participant>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

impl ChatMessage {
    pub(crate) fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    pub(crate) fn sent(&self) -> Option<DateTime<Utc>> {
        self.sent_at.as_deref().and_then(parse_timestamp)
    }

    pub(crate) fn is_from_fan(&self) -> bool {
        self.sender_type.as_deref() == Some("fan")
    }
}

/// A record decorated with the identity of the creator it was fetched for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatorScoped<T> {
    #[serde(flatten)]
    pub(crate) record: T,
    pub(crate) creator_uuid: String,
    pub(crate) creator_name: Option<String>,
    pub(crate) creator_handle: Option<String>,
}

impl<T> CreatorScoped<T> {
    pub(crate) fn new(creator: &Creator, record: T) -> Self {
        Self {
            record,
            creator_uuid: creator.uuid.clone(),
            creator_name: creator.name.clone().or_else(|| creator.display_name.clone()),
            creator_handle: creator.handle.clone(),
        }
    }
}
