//! Error types for orgward
//!
//! Validation failures carry the exact user-facing messages the platform's
//! controller layer surfaces ("invalid user", "no licenses available", ...).

use thiserror::Error;

use crate::types::OrgId;

/// Failures surfaced by membership and license operations
#[derive(Debug, Error)]
pub enum AccessError {
    /// The named user does not resolve to an account
    #[error("invalid user")]
    InvalidUser,

    /// The organization has no open license seats
    #[error("no licenses available")]
    NoLicensesAvailable,

    /// The user is already a member of a different organization
    #[error("already associated with a different organization")]
    AlreadyAssociated,

    #[error("organization not found: {0}")]
    OrganizationNotFound(OrgId),

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, AccessError>;
