//! Entity store collaborator
//!
//! The engine is storage-agnostic: it reads and writes users and
//! organizations through [`EntityStore`]. Every save advances the entity's
//! revision, which doubles as the cache-invalidation freshness marker.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{OrgId, Organization, Revision, User, UserId};

/// Load/save primitives for users and organizations
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load a user by id
    async fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Resolve a user by account name
    async fn user_by_name(&self, user_name: &str) -> Result<Option<User>>;

    /// Load an organization by id
    async fn organization(&self, id: OrgId) -> Result<Option<Organization>>;

    /// Persist a user, advancing its revision. Returns the new revision.
    async fn save_user(&self, user: User) -> Result<Revision>;

    /// Persist an organization, advancing its revision. Returns the new
    /// revision.
    async fn save_organization(&self, org: Organization) -> Result<Revision>;

    /// Advance an organization's freshness marker without other changes
    async fn touch_organization(&self, id: OrgId) -> Result<Revision>;
}
