//! In-memory EntityStore implementation
//!
//! Backs tests and single-process deployments; no persistence. Saves are
//! individually atomic and advance the stored entity's revision by one.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EntityStore;
use crate::error::{AccessError, Result};
use crate::types::{OrgId, Organization, Revision, User, UserId};

/// In-memory implementation of [`EntityStore`]
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    user_names: RwLock<HashMap<String, UserId>>,
    orgs: RwLock<HashMap<OrgId, Organization>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Number of stored organizations
    pub async fn org_count(&self) -> usize {
        self.orgs.read().await.len()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        let id = match self.user_names.read().await.get(user_name) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn organization(&self, id: OrgId) -> Result<Option<Organization>> {
        Ok(self.orgs.read().await.get(&id).cloned())
    }

    async fn save_user(&self, mut user: User) -> Result<Revision> {
        let mut users = self.users.write().await;
        let stored_revision = users.get(&user.id).map(|u| u.revision).unwrap_or(0);
        user.revision = stored_revision.max(user.revision) + 1;
        let revision = user.revision;
        self.user_names
            .write()
            .await
            .insert(user.user_name.clone(), user.id);
        users.insert(user.id, user);
        Ok(revision)
    }

    async fn save_organization(&self, mut org: Organization) -> Result<Revision> {
        let mut orgs = self.orgs.write().await;
        let stored_revision = orgs.get(&org.id).map(|o| o.revision).unwrap_or(0);
        org.revision = stored_revision.max(org.revision) + 1;
        let revision = org.revision;
        orgs.insert(org.id, org);
        Ok(revision)
    }

    async fn touch_organization(&self, id: OrgId) -> Result<Revision> {
        let mut orgs = self.orgs.write().await;
        let org = orgs
            .get_mut(&id)
            .ok_or(AccessError::OrganizationNotFound(id))?;
        org.revision += 1;
        Ok(org.revision)
    }
}
