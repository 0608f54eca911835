use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single administrative action a member may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    EditMembers,
    PostEvents,
    ManageVehicles,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::EditMembers => "edit_members",
            Capability::PostEvents => "post_events",
            Capability::ManageVehicles => "manage_vehicles",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability flags stored for one member.
///
/// A member without a stored row has [`Capabilities::default`], i.e. nothing
/// granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Capabilities {
    #[serde(default)]
    pub can_edit_members: bool,
    #[serde(default)]
    pub can_post_events: bool,
    #[serde(default)]
    pub can_manage_vehicles: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        can_edit_members: true,
        can_post_events: true,
        can_manage_vehicles: true,
    };

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::EditMembers => self.can_edit_members,
            Capability::PostEvents => self.can_post_events,
            Capability::ManageVehicles => self.can_manage_vehicles,
        }
    }

    pub fn role(&self) -> Role {
        if self.can_edit_members {
            Role::Admin
        } else if self.can_post_events || self.can_manage_vehicles {
            Role::Moderator
        } else {
            Role::Member
        }
    }
}

/// Derived classification of a member. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Member,
}

impl Role {
    /// Role for a member whose permission row may be missing.
    pub fn derive(capabilities: Option<&Capabilities>) -> Role {
        capabilities.map(Capabilities::role).unwrap_or(Role::Member)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the admin permission overview: a member and whatever flags they hold.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberCapabilities {
    pub member_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[sqlx(flatten)]
    pub capabilities: Capabilities,
}
