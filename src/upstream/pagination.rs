//! Usage: One paginator for both Fanvue continuation styles (page number and next cursor).

use crate::shared::error::{AppError, AppResult};
use crate::shared::security::sanitize_body_snippet;
use crate::upstream::session::UpstreamSession;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Where a pagination starts; the variant also selects the continuation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Continuation {
    PageNumber(u32),
    Cursor(Option<String>),
}

#[derive(Debug, Clone)]
pub(crate) struct PageRequest {
    pub(crate) start: Continuation,
    pub(crate) page_size: u32,
    pub(crate) max_pages: u32,
}

impl PageRequest {
    pub(crate) fn pages(page_size: u32, max_pages: u32) -> Self {
        Self {
            start: Continuation::PageNumber(1),
            page_size,
            max_pages,
        }
    }

    pub(crate) fn cursor(page_size: u32, max_pages: u32) -> Self {
        Self {
            start: Continuation::Cursor(None),
            page_size,
            max_pages,
        }
    }
}

/// What a 404 means at a given call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotFoundPolicy {
    /// Treated like any other non-OK status.
    Halt,
    /// The resource has no entries; pagination ends cleanly.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Halted {
    pub(crate) status: u16,
    pub(crate) body: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AggregateResult<T> {
    pub(crate) records: Vec<T>,
    pub(crate) pages_fetched: u32,
    pub(crate) has_more: bool,
    pub(crate) halted: Option<Halted>,
}

impl<T> AggregateResult<T> {
    pub(crate) fn total_count(&self) -> usize {
        self.records.len()
    }

    /// A pagination that halted before its first page failed as a whole.
    pub(crate) fn first_page_error(&self) -> Option<AppError> {
        if self.pages_fetched > 0 {
            return None;
        }
        let halted = self.halted.as_ref()?;
        if (200..300).contains(&halted.status) {
            // A 2xx halt means the envelope could not be decoded.
            return Some(AppError::new(
                "UPSTREAM_UNAVAILABLE",
                "upstream returned a malformed page",
            ));
        }
        Some(AppError::upstream_status(halted.status, halted.body.clone()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationMeta {
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    has_next_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct PageEnvelope<T> {
    #[serde(default)]
    data: Option<Vec<T>>,
    #[serde(default)]
    pagination: Option<PaginationMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "T: DeserializeOwned")]
struct CursorEnvelope<T> {
    #[serde(default)]
    data: Option<Vec<T>>,
    #[serde(default)]
    next_cursor: Option<String>,
}

struct DecodedPage<T> {
    records: Vec<T>,
    next: Option<Continuation>,
}

fn decode_page<T: DeserializeOwned>(
    current: &Continuation,
    body: &str,
) -> Result<DecodedPage<T>, serde_json::Error> {
    match current {
        Continuation::PageNumber(page) => {
            let envelope: PageEnvelope<T> = serde_json::from_str(body)?;
            let records = envelope.data.unwrap_or_default();
            let meta = envelope.pagination.unwrap_or_default();
            let more = meta.has_more.unwrap_or(false) || meta.has_next_page.unwrap_or(false);
            let next = (more && !records.is_empty())
                .then(|| Continuation::PageNumber(page.saturating_add(1)));
            Ok(DecodedPage { records, next })
        }
        Continuation::Cursor(_) => {
            let envelope: CursorEnvelope<T> = serde_json::from_str(body)?;
            let next = envelope
                .next_cursor
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .map(|c| Continuation::Cursor(Some(c)));
            Ok(DecodedPage {
                records: envelope.data.unwrap_or_default(),
                next,
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Paginator<'a> {
    session: &'a UpstreamSession,
    inter_page_delay: Duration,
    not_found: NotFoundPolicy,
}

impl<'a> Paginator<'a> {
    pub(crate) fn new(session: &'a UpstreamSession, inter_page_delay: Duration) -> Self {
        Self {
            session,
            inter_page_delay,
            not_found: NotFoundPolicy::Halt,
        }
    }

    pub(crate) fn with_not_found(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found = policy;
        self
    }

    /// Follows the continuation until exhausted or `max_pages` pages were read. A non-OK page
    /// ends the loop with what was accumulated; only transport, auth and rate-limit failures
    /// are errors.
    pub(crate) async fn collect<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        request: PageRequest,
    ) -> AppResult<AggregateResult<T>> {
        let max_pages = request.max_pages.max(1);
        let mut current = request.start;
        let mut result = AggregateResult {
            records: Vec::new(),
            pages_fetched: 0,
            has_more: false,
            halted: None,
        };

        loop {
            let mut page_query: Vec<(&str, String)> = query.to_vec();
            page_query.push(("size", request.page_size.to_string()));
            match &current {
                Continuation::PageNumber(page) => page_query.push(("page", page.to_string())),
                Continuation::Cursor(Some(cursor)) => page_query.push(("cursor", cursor.clone())),
                Continuation::Cursor(None) => {}
            }

            let response = self.session.get(path, &page_query).await?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| format!("UPSTREAM_UNAVAILABLE: failed to read upstream body: {e}"))?;

            if !status.is_success() {
                result.has_more = false;
                if status == StatusCode::NOT_FOUND && self.not_found == NotFoundPolicy::Empty {
                    tracing::debug!(path = %path, "upstream resource not found; treating as empty");
                    break;
                }
                if status == StatusCode::UNAUTHORIZED {
                    return Err("AUTH_REQUIRED: upstream rejected the credentials".into());
                }
                tracing::warn!(
                    path = %path,
                    status = status.as_u16(),
                    pages_fetched = result.pages_fetched,
                    "pagination stopped by upstream status"
                );
                result.halted = Some(Halted {
                    status: status.as_u16(),
                    body: sanitize_body_snippet(&body),
                });
                break;
            }

            let page = match decode_page::<T>(&current, &body) {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(path = %path, "pagination stopped by malformed page: {err}");
                    result.has_more = false;
                    result.halted = Some(Halted {
                        status: status.as_u16(),
                        body: sanitize_body_snippet(&body),
                    });
                    break;
                }
            };

            result.pages_fetched += 1;
            result.records.extend(page.records);

            let Some(next) = page.next else {
                result.has_more = false;
                break;
            };
            result.has_more = true;
            if result.pages_fetched >= max_pages {
                break;
            }
            current = next;
            if !self.inter_page_delay.is_zero() {
                tokio::time::sleep(self.inter_page_delay).await;
            }
        }

        Ok(result)
    }
}
