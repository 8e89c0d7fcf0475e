//! Usage: Chat threads of one creator with the first page of messages of each chat.

use crate::analytics::{Aggregation, MESSAGES_PAGE_SIZE, RECORDS_PAGE_SIZE};
use crate::shared::error::AppResult;
use crate::upstream::models::{Chat, ChatMessage};
use crate::upstream::pagination::{NotFoundPolicy, PageRequest};

/// Which messages endpoint a chat listing pairs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageEndpoint {
    /// `/chats/{chat}/messages`
    Chat,
    /// `/creators/{creator}/chats/{chat}/messages`
    CreatorChat,
}

impl MessageEndpoint {
    fn path(self, creator_uuid: &str, chat_uuid: &str) -> String {
        match self {
            MessageEndpoint::Chat => format!("/chats/{chat_uuid}/messages"),
            MessageEndpoint::CreatorChat => {
                format!("/creators/{creator_uuid}/chats/{chat_uuid}/messages")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ChatThread {
    pub(crate) chat: Chat,
    pub(crate) messages: Vec<ChatMessage>,
}

/// Threads of one creator. `listed` counts every chat the listing returned, including chats
/// whose messages could not be read.
#[derive(Debug, Clone, Default)]
pub(crate) struct CreatorThreads {
    pub(crate) listed: usize,
    pub(crate) threads: Vec<ChatThread>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ThreadQuery<'q> {
    pub(crate) chat_query: &'q [(&'static str, String)],
    pub(crate) message_query: &'q [(&'static str, String)],
    pub(crate) chat_pages: u32,
    pub(crate) endpoint: MessageEndpoint,
}

/// Chats of `creator_uuid` and one page of messages per chat, chats walked sequentially.
/// A failing chat listing is an error; a failing message page only drops that chat.
pub(crate) async fn load_threads(
    agg: Aggregation<'_>,
    creator_uuid: &str,
    query: ThreadQuery<'_>,
) -> AppResult<CreatorThreads> {
    let chats_path = format!("/creators/{creator_uuid}/chats");
    let chats = agg
        .paginator()
        .collect::<Chat>(
            &chats_path,
            query.chat_query,
            PageRequest::pages(RECORDS_PAGE_SIZE, query.chat_pages),
        )
        .await?;
    if let Some(err) = chats.first_page_error() {
        return Err(err);
    }

    let messages_paginator = agg.paginator().with_not_found(NotFoundPolicy::Empty);
    let listed = chats.records.len();
    let mut threads = Vec::with_capacity(listed);
    for chat in chats.records {
        let path = query.endpoint.path(creator_uuid, &chat.uuid);
        let page = messages_paginator
            .collect::<ChatMessage>(
                &path,
                query.message_query,
                PageRequest::pages(MESSAGES_PAGE_SIZE, 1),
            )
            .await?;
        if page.halted.is_some() {
            tracing::warn!(
                creator_uuid = %creator_uuid,
                chat_uuid = %chat.uuid,
                "chat skipped: messages unavailable"
            );
            continue;
        }
        threads.push(ChatThread {
            chat,
            messages: page.records,
        });
    }
    Ok(CreatorThreads { listed, threads })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::batch::FanOut;
    use crate::infra::settings::AppSettings;
    use crate::oauth::token_manager::TokenManager;
    use crate::upstream::client::{RetryPolicy, UpstreamClient};
    use crate::upstream::credentials::Credentials;
    use crate::upstream::session::UpstreamSession;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(server: &MockServer) -> UpstreamSession {
        let http = reqwest::Client::new();
        let client = UpstreamClient::new(
            http.clone(),
            &server.uri(),
            "2025-06-26",
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
        )
        .expect("client");
        UpstreamSession::new(
            Arc::new(client),
            Arc::new(TokenManager::new(http, &AppSettings::default())),
            Credentials::ApiKey("k".to_string()),
        )
    }

    fn aggregation(session: &UpstreamSession) -> Aggregation<'_> {
        Aggregation {
            session,
            page_delay: Duration::ZERO,
            fanout: FanOut::new(2, Duration::ZERO),
        }
    }

    const QUERY: ThreadQuery<'static> = ThreadQuery {
        chat_query: &[],
        message_query: &[],
        chat_pages: 1,
        endpoint: MessageEndpoint::Chat,
    };

    #[tokio::test]
    async fn missing_messages_are_empty_and_failing_messages_drop_only_that_chat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creators/c1/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"uuid": "a"}, {"uuid": "b"}, {"uuid": "c"}],
                "pagination": {"hasMore": false}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/a/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"uuid": "m1", "senderType": "fan"}],
                "pagination": {"hasMore": false}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/b/messages"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/c/messages"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let loaded = load_threads(aggregation(&session), "c1", QUERY)
            .await
            .expect("threads");
        assert_eq!(loaded.listed, 3);
        let ids: Vec<&str> = loaded.threads.iter().map(|t| t.chat.uuid.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(loaded.threads[0].messages.len(), 1);
        assert!(loaded.threads[1].messages.is_empty());
    }

    #[tokio::test]
    async fn failing_chat_listing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creators/c1/chats"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let err = load_threads(aggregation(&session), "c1", QUERY)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_STATUS");
        assert_eq!(err.upstream_status_code(), Some(503));
    }

    #[tokio::test]
    async fn creator_chat_endpoint_is_scoped_to_the_creator() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creators/c1/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"uuid": "a"}],
                "pagination": {"hasMore": false}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/creators/c1/chats/a/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"uuid": "m1"}, {"uuid": "m2"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let query = ThreadQuery {
            endpoint: MessageEndpoint::CreatorChat,
            ..QUERY
        };
        let loaded = load_threads(aggregation(&session), "c1", query)
            .await
            .expect("threads");
        assert_eq!(loaded.listed, 1);
        assert_eq!(loaded.threads[0].messages.len(), 2);
    }
}
