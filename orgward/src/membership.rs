//! Organization membership manager
//!
//! The only place relationship records change. Every operation runs under a
//! per-organization lock so the license check-and-increment and the
//! freshness bump commit as one unit; every successful mutation advances the
//! organization's revision (and the touched user's), which is the sole cache
//! invalidation trigger. Notification dispatch is fire-and-forget: failures
//! are logged, never propagated, and never roll back a committed change.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{AccessError, Result};
use crate::licensing::{self, LicenseConfig, OrgSettingsUpdate, SettingsOutcome};
use crate::notify::{MembershipEvent, Notifier, NullNotifier};
use crate::store::EntityStore;
use crate::types::{ManagerRole, OrgId, OrgMembership, Organization, Revision, SupervisorRole, User};

/// Mutates organization relationship records through the entity store
pub struct MembershipManager {
    store: Arc<dyn EntityStore>,
    notifier: Arc<dyn Notifier>,
    config: LicenseConfig,
    org_locks: Mutex<HashMap<OrgId, Arc<Mutex<()>>>>,
}

impl MembershipManager {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            notifier: Arc::new(NullNotifier),
            config: LicenseConfig::default(),
            org_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_config(mut self, config: LicenseConfig) -> Self {
        self.config = config;
        self
    }

    /// Grant a manager role. `full` managers gain supervisory rights over
    /// org members; assistants do not.
    ///
    /// The first organization claimed becomes the user's primary
    /// `managed_organization_id`; later managerships are recorded in the
    /// role map without overwriting it.
    pub async fn add_manager(&self, org_id: OrgId, user_name: &str, full: bool) -> Result<bool> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        self.org(org_id).await?;
        let mut user = self.named_user(user_name).await?;
        user.manager_for
            .insert(org_id, ManagerRole { full_manager: full });
        if user.managed_organization_id.is_none() {
            user.managed_organization_id = Some(org_id);
        }
        self.store.save_user(user).await?;
        let revision = self.store.touch_organization(org_id).await?;
        info!(%org_id, user_name, full, revision, "added manager");
        Ok(true)
    }

    /// Revoke a manager role, leaving other organizations' entries intact
    ///
    /// No-op on the primary link when the user primarily manages a different
    /// organization.
    pub async fn remove_manager(&self, org_id: OrgId, user_name: &str) -> Result<bool> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        self.org(org_id).await?;
        let mut user = self.named_user(user_name).await?;
        user.manager_for.remove(&org_id);
        if user.managed_organization_id == Some(org_id) {
            user.managed_organization_id = None;
        }
        self.store.save_user(user).await?;
        let revision = self.store.touch_organization(org_id).await?;
        info!(%org_id, user_name, revision, "removed manager");
        Ok(true)
    }

    /// Upsert a supervisor role. Re-invoking with a different `pending`
    /// updates in place, which is how an invitation gets accepted.
    pub async fn add_supervisor(
        &self,
        org_id: OrgId,
        user_name: &str,
        pending: bool,
    ) -> Result<bool> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        self.org(org_id).await?;
        let mut user = self.named_user(user_name).await?;
        user.supervisor_for
            .insert(org_id, SupervisorRole { pending });
        self.store.save_user(user).await?;
        let revision = self.store.touch_organization(org_id).await?;
        info!(%org_id, user_name, pending, revision, "added supervisor");
        Ok(true)
    }

    /// Remove a supervisor role, leaving other organizations' entries intact
    pub async fn remove_supervisor(&self, org_id: OrgId, user_name: &str) -> Result<bool> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        self.org(org_id).await?;
        let mut user = self.named_user(user_name).await?;
        user.supervisor_for.remove(&org_id);
        self.store.save_user(user).await?;
        let revision = self.store.touch_organization(org_id).await?;
        info!(%org_id, user_name, revision, "removed supervisor");
        Ok(true)
    }

    /// Add a member. Sponsored members consume a license seat and have their
    /// personal subscription clock paused; the capacity check and the
    /// membership write commit under the org lock as one unit.
    ///
    /// Notifies the user unless the membership is pending.
    pub async fn add_user(
        &self,
        org_id: OrgId,
        user_name: &str,
        pending: bool,
        sponsored: bool,
    ) -> Result<bool> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        let mut org = self.org(org_id).await?;
        let mut user = self.named_user(user_name).await?;
        if let Some(existing) = user.managing_organization_id
            && existing != org_id
        {
            return Err(AccessError::AlreadyAssociated);
        }

        let was_sponsored = user.sponsored_user_of(org_id);
        if sponsored && !was_sponsored && org.at_capacity() {
            return Err(AccessError::NoLicensesAvailable);
        }

        let rollback = user.clone();
        if sponsored && !was_sponsored {
            licensing::pause_subscription(&mut user, Utc::now());
        } else if !sponsored && was_sponsored {
            // Sponsorship is being withdrawn in place; restart the personal
            // clock now so no stale paused record survives
            licensing::resume_subscription(&mut user, Utc::now(), &self.config);
        }
        user.managed_by
            .insert(org_id, OrgMembership { pending, sponsored });
        user.managing_organization_id = Some(org_id);
        let user_id = user.id;
        self.store.save_user(user).await?;

        if sponsored && !was_sponsored {
            org.used_licenses += 1;
        } else if !sponsored && was_sponsored {
            org.used_licenses = org.used_licenses.saturating_sub(1);
        }
        let revision = self.save_org_or_restore(org, rollback).await?;
        info!(%org_id, user_name, pending, sponsored, revision, "added user");

        if !pending {
            self.dispatch(MembershipEvent::OrganizationAssigned { user_id, org_id });
        }
        Ok(true)
    }

    /// Remove a member, resuming their personal subscription clock, and
    /// notify them
    pub async fn remove_user(&self, org_id: OrgId, user_name: &str) -> Result<bool> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        let mut org = self.org(org_id).await?;
        let mut user = self.named_user(user_name).await?;
        if let Some(existing) = user.managing_organization_id
            && existing != org_id
        {
            return Err(AccessError::AlreadyAssociated);
        }

        let was_sponsored = user.sponsored_user_of(org_id);
        let rollback = user.clone();
        user.managed_by.remove(&org_id);
        if user.managing_organization_id == Some(org_id) {
            user.managing_organization_id = None;
        }
        licensing::resume_subscription(&mut user, Utc::now(), &self.config);
        let user_id = user.id;
        self.store.save_user(user).await?;

        if was_sponsored {
            org.used_licenses = org.used_licenses.saturating_sub(1);
        }
        let revision = self.save_org_or_restore(org, rollback).await?;
        info!(%org_id, user_name, revision, "removed user");

        self.dispatch(MembershipEvent::OrganizationUnassigned { user_id, org_id });
        Ok(true)
    }

    /// Apply an organization settings update
    ///
    /// Field-level problems are collected and returned with an unapplied
    /// outcome instead of an error, leaving the organization untouched.
    pub async fn process_settings(
        &self,
        org_id: OrgId,
        update: &OrgSettingsUpdate,
    ) -> Result<SettingsOutcome> {
        let lock = self.org_lock(org_id).await;
        let _guard = lock.lock().await;

        let mut org = self.org(org_id).await?;
        let outcome = licensing::apply_settings(&mut org, update);
        if outcome.applied {
            let revision = self.store.save_organization(org).await?;
            info!(%org_id, revision, "processed settings");
        }
        Ok(outcome)
    }

    /// Fire-and-forget notification dispatch
    fn dispatch(&self, event: MembershipEvent) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(error) = notifier.deliver(event).await {
                warn!(%error, "membership notification dropped");
            }
        });
    }

    /// Save the organization; on failure restore the user record so the
    /// membership write and the seat count never diverge
    async fn save_org_or_restore(&self, org: Organization, rollback: User) -> Result<Revision> {
        match self.store.save_organization(org).await {
            Ok(revision) => Ok(revision),
            Err(error) => {
                if let Err(restore_error) = self.store.save_user(rollback).await {
                    warn!(%restore_error, "user restore failed after organization save error");
                }
                Err(error)
            }
        }
    }

    async fn org_lock(&self, org_id: OrgId) -> Arc<Mutex<()>> {
        let mut locks = self.org_locks.lock().await;
        // An entry whose only Arc lives in the map has no holder; reclaim it
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(org_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    async fn org_lock_count(&self) -> usize {
        self.org_locks.lock().await.len()
    }

    async fn org(&self, id: OrgId) -> Result<Organization> {
        self.store
            .organization(id)
            .await?
            .ok_or(AccessError::OrganizationNotFound(id))
    }

    async fn named_user(&self, user_name: &str) -> Result<User> {
        self.store
            .user_by_name(user_name)
            .await?
            .ok_or(AccessError::InvalidUser)
    }
}
