use uuid::Uuid;

use crate::models::activity::{Action, ActivityEntry, ActivityQuery};
use crate::store::Store;
use crate::utils::error::AppResult;

/// Appends to the activity log. A failed write is logged, never surfaced:
/// the action being recorded has already happened.
pub async fn record(store: &dyn Store, member_id: Option<Uuid>, action: Action, details: Option<&str>) {
    if let Err(e) = store.record_activity(member_id, action.as_str(), details).await {
        tracing::warn!(error = ?e, action = action.as_str(), "Failed to record activity");
    }
}

pub async fn recent(store: &dyn Store, query: ActivityQuery) -> AppResult<Vec<ActivityEntry>> {
    Ok(store.recent_activity(query.limit()).await?)
}
