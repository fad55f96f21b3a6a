//! Organizations and their license capacity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrgId, Revision};

/// An organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    /// Admin organizations' full managers supervise every user system-wide
    #[serde(default)]
    pub admin: bool,
    /// Public organizations expose read-only view to unauthenticated callers
    #[serde(default)]
    pub public: bool,
    /// Seat capacity
    #[serde(default)]
    pub total_licenses: u32,
    /// Count of currently sponsored members, maintained with membership writes
    #[serde(default)]
    pub used_licenses: u32,
    /// Freshness marker, advanced by the store on every mutation
    #[serde(default)]
    pub revision: Revision,
}

impl Organization {
    /// Create an organization with no license capacity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            admin: false,
            public: false,
            total_licenses: 0,
            used_licenses: 0,
            revision: 0,
        }
    }

    pub fn with_total_licenses(mut self, total: u32) -> Self {
        self.total_licenses = total;
        self
    }

    pub fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn with_public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Seats still available for sponsored members
    pub fn open_seats(&self) -> u32 {
        self.total_licenses.saturating_sub(self.used_licenses)
    }

    /// No seats left for another sponsored member
    pub fn at_capacity(&self) -> bool {
        self.used_licenses >= self.total_licenses
    }
}
