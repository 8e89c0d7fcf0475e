//! Usage: Cross-creator aggregation (flat lists, engagement rollups, Power BI feeds).

pub(crate) mod batch;
pub(crate) mod chats;
pub(crate) mod creators;
pub(crate) mod dates;
pub(crate) mod fan_engagement;
pub(crate) mod flat;
pub(crate) mod message_analytics;
pub(crate) mod message_volume;
pub(crate) mod mock;
pub(crate) mod powerbi;

use crate::upstream::pagination::Paginator;
use crate::upstream::session::UpstreamSession;
use batch::FanOut;
use std::time::Duration;

pub(crate) const DEFAULT_MAX_PAGES: u32 = 5;
pub(crate) const RECORDS_PAGE_SIZE: u32 = 50;
pub(crate) const MESSAGES_PAGE_SIZE: u32 = 100;

/// Everything one aggregation needs: the request's session plus pacing knobs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Aggregation<'a> {
    pub(crate) session: &'a UpstreamSession,
    pub(crate) page_delay: Duration,
    pub(crate) fanout: FanOut,
}

impl<'a> Aggregation<'a> {
    pub(crate) fn paginator(&self) -> Paginator<'a> {
        Paginator::new(self.session, self.page_delay)
    }
}
