//! User accounts and their organization relationships

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ManagerRole, OrgId, OrgMembership, Revision, Subscription, SupervisorRole, UserId};

/// A user account
///
/// Role relationships are keyed by organization. A user may manage or
/// supervise for arbitrarily many organizations, but holds at most one
/// license-granting membership (`managing_organization_id`) and at most one
/// primary managership (`managed_organization_id`) at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    /// Profile is visible to unauthenticated callers
    #[serde(default)]
    pub public: bool,
    /// When the personal subscription lapses
    pub expires_at: Option<DateTime<Utc>>,
    /// Paused personal subscription state while org-sponsored
    pub subscription: Option<Subscription>,
    /// Organizations this user manages, full or assistant
    #[serde(default)]
    pub manager_for: HashMap<OrgId, ManagerRole>,
    /// Organizations this user supervises for
    #[serde(default)]
    pub supervisor_for: HashMap<OrgId, SupervisorRole>,
    /// Organizations this user is a member of
    #[serde(default)]
    pub managed_by: HashMap<OrgId, OrgMembership>,
    /// The single organization whose license covers this user
    pub managing_organization_id: Option<OrgId>,
    /// The single organization this user primarily manages
    pub managed_organization_id: Option<OrgId>,
    /// Freshness marker, advanced by the store on every save
    #[serde(default)]
    pub revision: Revision,
}

impl User {
    /// Create a fresh account with no organization relationships
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user_name.into(),
            public: false,
            expires_at: None,
            subscription: None,
            manager_for: HashMap::new(),
            supervisor_for: HashMap::new(),
            managed_by: HashMap::new(),
            managing_organization_id: None,
            managed_organization_id: None,
            revision: 0,
        }
    }

    /// Set the personal subscription expiration
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Full manager of the given organization
    pub fn manager_of(&self, org: OrgId) -> bool {
        self.manager_for.get(&org).is_some_and(|r| r.full_manager)
    }

    /// Any manager role over the given organization, full or assistant
    pub fn assistant_of(&self, org: OrgId) -> bool {
        self.manager_for.contains_key(&org)
    }

    /// Supervisor for the given organization, pending or accepted
    pub fn supervisor_of(&self, org: OrgId) -> bool {
        self.supervisor_for.contains_key(&org)
    }

    /// Supervisor invitation not yet accepted
    pub fn pending_supervisor_of(&self, org: OrgId) -> bool {
        self.supervisor_for.get(&org).is_some_and(|r| r.pending)
    }

    /// Member of the given organization, pending or accepted
    pub fn managed_user_of(&self, org: OrgId) -> bool {
        self.managed_by.contains_key(&org)
    }

    /// Membership invitation not yet accepted
    pub fn pending_user_of(&self, org: OrgId) -> bool {
        self.managed_by.get(&org).is_some_and(|m| m.pending)
    }

    /// Membership whose subscription the organization's license covers
    pub fn sponsored_user_of(&self, org: OrgId) -> bool {
        self.managed_by.get(&org).is_some_and(|m| m.sponsored)
    }
}
