//! Membership notification seam
//!
//! Delivery (email, push) lives outside the authorization contract; the
//! membership manager dispatches events here best-effort and swallows
//! failures. Implementations must never block a mutation's outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::types::{OrgId, UserId};

/// Events emitted after a committed membership change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipEvent {
    /// A user was added to an organization (non-pending only)
    OrganizationAssigned { user_id: UserId, org_id: OrgId },
    /// A user was removed from an organization
    OrganizationUnassigned { user_id: UserId, org_id: OrgId },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to deliver notification: {0}")]
    SendFailed(String),
}

/// Downstream notification dispatch
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, event: MembershipEvent) -> Result<(), NotifyError>;
}

/// Discards all events; the default when no delivery channel is wired up
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn deliver(&self, _event: MembershipEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Records delivered events for assertions in tests
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<MembershipEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far
    pub async fn events(&self) -> Vec<MembershipEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, event: MembershipEvent) -> Result<(), NotifyError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
