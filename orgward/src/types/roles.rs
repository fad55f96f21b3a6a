//! Per-(user, organization) role-relationship records
//!
//! Fixed-shape records rather than open-ended maps, so the role registry
//! lookup stays exhaustive and statically checkable.

use serde::{Deserialize, Serialize};

/// A user manages an organization, either fully or as an assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRole {
    /// Full managers gain supervisory rights over org members;
    /// assistants only get view/edit on the org itself
    pub full_manager: bool,
}

/// A user supervises for an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorRole {
    /// An invitation awaiting acceptance contributes no active grants
    pub pending: bool,
}

/// A user is a member of an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    /// Membership not yet accepted by the user
    pub pending: bool,
    /// The organization's license covers this user's subscription
    pub sponsored: bool,
}

/// Paused personal subscription state while a user is org-sponsored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Whether the pause was caused by organizational sponsorship
    pub org_sponsored: bool,
    /// Seconds that remained on the personal clock when it was paused
    pub seconds_left: i64,
}
