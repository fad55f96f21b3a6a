//! Entity types for the authorization engine

mod org;
mod roles;
mod user;

pub use org::Organization;
pub use roles::{ManagerRole, OrgMembership, Subscription, SupervisorRole};
pub use user::User;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user account
pub type UserId = Uuid;

/// Unique identifier for an organization
pub type OrgId = Uuid;

/// Monotonic freshness marker, advanced once per successful mutation
pub type Revision = u64;

/// Reference to either side of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    User(UserId),
    Organization(OrgId),
}

impl EntityRef {
    /// The underlying entity identifier
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) => *id,
            Self::Organization(id) => *id,
        }
    }
}
