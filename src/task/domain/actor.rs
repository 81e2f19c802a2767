//! Actor identity and role types consumed by the permission guard.

use super::ActorId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role attached to an actor by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Regular organisation member.
    Member,
    /// Administrator with full task privileges.
    Admin,
    /// Organisation administrator; may change any task's status but not
    /// delete on behalf of others.
    OrgAdmin,
}

/// An authenticated principal acting on tasks.
///
/// # Examples
///
/// ```
/// use quorum::task::domain::{Actor, ActorRole};
///
/// let actor = Actor::new(ActorRole::Member);
/// assert_eq!(actor.role(), ActorRole::Member);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    role: ActorRole,
}

/// Fixed UUID of the synthetic system actor used for consensus-driven and
/// auto-approval transitions.
const SYSTEM_ACTOR_UUID: Uuid = Uuid::from_u128(0x5153_0000_0000_0000_0000_0000_0000_0001);

impl Actor {
    /// Creates an actor with a fresh identifier and the given role.
    #[must_use]
    pub fn new(role: ActorRole) -> Self {
        Self {
            id: ActorId::new(),
            role,
        }
    }

    /// Creates an actor from known identity-provider data.
    #[must_use]
    pub const fn from_parts(id: ActorId, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// Returns the well-known system actor.
    ///
    /// Consensus resolutions and auto-approvals are attributed to this
    /// principal. It carries the admin role so the permission guard accepts
    /// engine-originated transitions on any task.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            id: ActorId::from_uuid(SYSTEM_ACTOR_UUID),
            role: ActorRole::Admin,
        }
    }

    /// Returns the actor identifier.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Returns the actor role.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }

    /// Returns true when this is the well-known system actor.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.id == Self::system().id
    }
}
