//! Usage: Creator roster lookup (first page of the creators listing).

use crate::shared::error::AppResult;
use crate::upstream::models::Creator;
use crate::upstream::session::UpstreamSession;
use serde::Deserialize;

pub(crate) const ROSTER_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Roster {
    /// `/creators`, used by the dashboard aggregates.
    Creators,
    /// `/agencies/creators`, used by the Power BI feeds.
    Agency,
}

impl Roster {
    fn path(self) -> &'static str {
        match self {
            Roster::Creators => "/creators",
            Roster::Agency => "/agencies/creators",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatorList {
    #[serde(default)]
    data: Option<Vec<Creator>>,
}

/// A failed roster call fails the whole aggregate with the upstream status.
pub(crate) async fn list_creators(
    session: &UpstreamSession,
    roster: Roster,
) -> AppResult<Vec<Creator>> {
    let mut query = vec![("size", ROSTER_PAGE_SIZE.to_string())];
    if roster == Roster::Creators {
        query.insert(0, ("page", "1".to_string()));
    }
    let list: CreatorList = session.get_json(roster.path(), &query).await?;
    let creators = list.data.unwrap_or_default();
    tracing::debug!(roster = roster.path(), count = creators.len(), "creator roster loaded");
    Ok(creators)
}
