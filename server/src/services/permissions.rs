//! Capability lookup and role derivation.
//!
//! Capabilities are read from the store on every check. A failed lookup is
//! treated as "nothing granted", so guarded routes fail closed.

use uuid::Uuid;

use crate::models::activity::Action;
use crate::models::member::Member;
use crate::models::permission::{Capabilities, MemberCapabilities, Role};
use crate::services::activity;
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

pub async fn capabilities_for(store: &dyn Store, member_id: Uuid) -> Capabilities {
    match store.capabilities(member_id).await {
        Ok(Some(capabilities)) => capabilities,
        Ok(None) => Capabilities::default(),
        Err(e) => {
            tracing::warn!(error = ?e, %member_id, "Permission lookup failed, denying");
            Capabilities::default()
        }
    }
}

pub async fn overview(store: &dyn Store) -> AppResult<Vec<MemberCapabilities>> {
    Ok(store.list_member_capabilities().await?)
}

/// Replaces the member's flags. `actor` is whoever made the change.
pub async fn update(
    store: &dyn Store,
    actor: Option<Uuid>,
    member_id: Uuid,
    capabilities: Capabilities,
) -> AppResult<Role> {
    let member = store
        .member_by_id(member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    store.set_capabilities(member.id, capabilities).await?;

    let role = capabilities.role();
    tracing::info!(member = %member.username, %role, "Permissions updated");
    let details = format!("{} is now {}", member.username, role);
    activity::record(store, actor, Action::PermissionsChanged, Some(&details)).await;

    Ok(role)
}

/// Grants every capability to `username`. Used to bootstrap the first admin.
pub async fn grant_admin(store: &dyn Store, username: &str) -> AppResult<Member> {
    let member = store
        .member_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No member named '{username}'")))?;
    update(store, None, member.id, Capabilities::ALL).await?;
    Ok(member)
}
