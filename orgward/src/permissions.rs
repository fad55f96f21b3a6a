//! Permission engine: computes the grant mapping between two entities
//!
//! The computation is a union of grants over an enumerated list of
//! contributing relationships (see [`crate::registry`]), so every rule is
//! visible in one place. Read-only against the store, total, deterministic;
//! results are memoized through the revision-keyed [`PermissionCache`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::cache::{CacheKey, PermissionCache};
use crate::registry::{self, ADMIN_MANAGER_GRANTS, Grant};
use crate::store::EntityStore;
use crate::types::{EntityRef, OrgId, Organization, Revision, User, UserId};

/// Ordered mapping of named boolean grants for a (subject, target) pair
///
/// Always carries the subject's identifier tag, even when every grant is
/// false. An unresolvable target yields a map holding only
/// `view_existence = false`, so "no permissions" stays distinguishable from
/// "unknown target".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMap {
    subject_id: Option<Uuid>,
    grants: BTreeMap<Grant, bool>,
}

impl PermissionMap {
    /// Empty mapping tagged with the subject identifier
    pub fn new(subject_id: Option<Uuid>) -> Self {
        Self {
            subject_id,
            grants: BTreeMap::new(),
        }
    }

    /// Mapping for a target that did not resolve
    pub fn unknown_target(subject_id: Option<Uuid>) -> Self {
        let mut map = Self::new(subject_id);
        map.grants.insert(Grant::ViewExistence, false);
        map
    }

    /// Maximal mapping: every grant true. Used for self-access.
    pub fn all(subject_id: Option<Uuid>) -> Self {
        let mut map = Self::new(subject_id);
        for grant in Grant::ALL {
            map.grants.insert(grant, true);
        }
        map
    }

    /// Turn a single grant on. Grants are never subtracted.
    pub fn grant(&mut self, grant: Grant) {
        self.grants.insert(grant, true);
    }

    /// Turn a set of grants on
    pub fn grant_all(&mut self, grants: &[Grant]) {
        for grant in grants {
            self.grant(*grant);
        }
    }

    /// Whether the named grant is held
    pub fn allows(&self, grant: Grant) -> bool {
        self.grants.get(&grant).copied().unwrap_or(false)
    }

    /// Whether the grant named by `action` is held; unknown names are false
    pub fn allows_action(&self, action: &str) -> bool {
        Grant::from_str(action).is_some_and(|grant| self.allows(grant))
    }

    /// The subject identifier tag
    pub fn subject_id(&self) -> Option<Uuid> {
        self.subject_id
    }

    /// Grants currently held, in mapping order
    pub fn granted(&self) -> impl Iterator<Item = Grant> + '_ {
        self.grants
            .iter()
            .filter(|(_, held)| **held)
            .map(|(grant, _)| *grant)
    }
}

/// Resolved subject context for one computation
enum SubjectCtx {
    User(User),
    Organization(Organization),
}

impl SubjectCtx {
    fn id(&self) -> Uuid {
        match self {
            Self::User(u) => u.id,
            Self::Organization(o) => o.id,
        }
    }

    fn revision(&self) -> Revision {
        match self {
            Self::User(u) => u.revision,
            Self::Organization(o) => o.revision,
        }
    }
}

/// Computes permission mappings between entities
pub struct PermissionEngine {
    store: Arc<dyn EntityStore>,
    cache: PermissionCache,
}

impl PermissionEngine {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_cache(store, PermissionCache::new())
    }

    pub fn with_cache(store: Arc<dyn EntityStore>, cache: PermissionCache) -> Self {
        Self { store, cache }
    }

    /// Compute the permission mapping between `subject` and `target`
    ///
    /// Total: absent subjects, unresolvable references, and store failures
    /// all degrade to mappings with no active grants rather than errors.
    pub async fn permissions_for(
        &self,
        subject: Option<EntityRef>,
        target: EntityRef,
    ) -> PermissionMap {
        let subject_tag = subject.map(|s| s.id());
        let subject_ctx = match subject {
            None => None,
            Some(EntityRef::User(id)) => self.load_user(id).await.map(SubjectCtx::User),
            Some(EntityRef::Organization(id)) => {
                self.load_org(id).await.map(SubjectCtx::Organization)
            }
        };
        // A provided-but-unresolvable subject must not share a cache slot
        // with the anonymous one: the tags differ.
        let cacheable = subject.is_none() || subject_ctx.is_some();
        let subject_key = subject_ctx.as_ref().map(|c| (c.id(), c.revision()));

        match target {
            EntityRef::User(id) => {
                let Some(target_user) = self.load_user(id).await else {
                    return PermissionMap::unknown_target(subject_tag);
                };
                let key = CacheKey {
                    subject: subject_key,
                    target: (target_user.id, target_user.revision),
                };
                if cacheable && let Some(hit) = self.cache.get(&key).await {
                    return hit;
                }
                let map = self
                    .user_target(subject_tag, subject_ctx.as_ref(), &target_user)
                    .await;
                if cacheable {
                    self.cache.insert(key, map.clone()).await;
                }
                map
            }
            EntityRef::Organization(id) => {
                let Some(target_org) = self.load_org(id).await else {
                    return PermissionMap::unknown_target(subject_tag);
                };
                let key = CacheKey {
                    subject: subject_key,
                    target: (target_org.id, target_org.revision),
                };
                if cacheable && let Some(hit) = self.cache.get(&key).await {
                    return hit;
                }
                let map = self.org_target(subject_tag, subject_ctx.as_ref(), &target_org);
                if cacheable {
                    self.cache.insert(key, map.clone()).await;
                }
                map
            }
        }
    }

    /// Whether `subject` holds the grant named by `action` over `target`
    pub async fn allowed(
        &self,
        subject: Option<EntityRef>,
        target: EntityRef,
        action: &str,
    ) -> bool {
        self.permissions_for(subject, target)
            .await
            .allows_action(action)
    }

    /// Coarse cross-organization query: does `subject` fully manage an
    /// organization that administers `target` (by membership or accepted
    /// supervisorship), or fully manage any admin organization?
    pub async fn manager_for(&self, subject: Option<UserId>, target: Option<UserId>) -> bool {
        let (Some(subject_id), Some(target_id)) = (subject, target) else {
            return false;
        };
        let Some(subject) = self.load_user(subject_id).await else {
            return false;
        };
        let Some(target) = self.load_user(target_id).await else {
            return false;
        };

        if target.managed_by.keys().any(|org| subject.manager_of(*org)) {
            return true;
        }
        if target
            .supervisor_for
            .iter()
            .any(|(org, role)| !role.pending && subject.manager_of(*org))
        {
            return true;
        }
        self.admin_manager(&subject).await
    }

    /// Mapping for a user target, per the union-of-grants algorithm
    async fn user_target(
        &self,
        tag: Option<Uuid>,
        subject: Option<&SubjectCtx>,
        target: &User,
    ) -> PermissionMap {
        let mut map = PermissionMap::new(tag);
        let subject_user = match subject {
            // Anonymous (or unresolvable) callers see public profiles only
            None => {
                if target.public {
                    map.grant(Grant::View);
                }
                return map;
            }
            Some(SubjectCtx::Organization(_)) => {
                // Organizations hold no roles over users
                map.grant(Grant::ViewExistence);
                return map;
            }
            Some(SubjectCtx::User(u)) => u,
        };

        if subject_user.id == target.id {
            return PermissionMap::all(tag);
        }

        map.grant(Grant::ViewExistence);
        if target.public {
            map.grant(Grant::View);
        }

        // Union grants over every org the target is a member of; pending
        // memberships are invitations, not capabilities
        for (org_id, membership) in &target.managed_by {
            if membership.pending {
                continue;
            }
            for role in registry::roles_for(subject_user, *org_id) {
                map.grant_all(role.grants_over_member());
            }
        }

        // Same for orgs the target supervises for
        for (org_id, role_record) in &target.supervisor_for {
            if role_record.pending {
                continue;
            }
            for role in registry::roles_for(subject_user, *org_id) {
                map.grant_all(role.grants_over_supervisor());
            }
        }

        // Admin-org full managers supervise every user system-wide
        if self.admin_manager(subject_user).await {
            map.grant_all(ADMIN_MANAGER_GRANTS);
        }

        map
    }

    /// Mapping for an organization target
    fn org_target(
        &self,
        tag: Option<Uuid>,
        subject: Option<&SubjectCtx>,
        target: &Organization,
    ) -> PermissionMap {
        if let Some(SubjectCtx::Organization(org)) = subject
            && org.id == target.id
        {
            return PermissionMap::all(tag);
        }

        let mut map = PermissionMap::new(tag);
        if let Some(SubjectCtx::User(user)) = subject {
            for role in registry::roles_for(user, target.id) {
                map.grant_all(role.grants_over_org());
            }
        }
        if target.public {
            map.grant(Grant::View);
        }
        map
    }

    /// Whether the user fully manages any admin organization
    async fn admin_manager(&self, user: &User) -> bool {
        for (org_id, role) in &user.manager_for {
            if role.full_manager
                && self
                    .load_org(*org_id)
                    .await
                    .is_some_and(|org| org.admin)
            {
                return true;
            }
        }
        false
    }

    async fn load_user(&self, id: UserId) -> Option<User> {
        match self.store.user(id).await {
            Ok(user) => user,
            Err(error) => {
                warn!(%id, %error, "store failed loading user, treating as absent");
                None
            }
        }
    }

    async fn load_org(&self, id: OrgId) -> Option<Organization> {
        match self.store.organization(id).await {
            Ok(org) => org,
            Err(error) => {
                warn!(%id, %error, "store failed loading organization, treating as absent");
                None
            }
        }
    }
}
