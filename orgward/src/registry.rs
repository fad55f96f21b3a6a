//! Role registry: the static table mapping role kinds to permission grants
//!
//! A flat lookup, no polymorphism. The permission engine unions these grant
//! sets across every qualifying relationship; any one relationship producing
//! a grant is sufficient (most permissive wins).

use serde::{Deserialize, Serialize};

use crate::types::{OrgId, User};

/// Named boolean grants in a permission mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    ViewExistence,
    ViewDetailed,
    View,
    Edit,
    Manage,
    Supervise,
    ManageSupervision,
    SupportActions,
    AdminSupportActions,
    ViewDeletedBoards,
}

impl Grant {
    /// Every grant name, in mapping order
    pub const ALL: [Grant; 10] = [
        Grant::ViewExistence,
        Grant::ViewDetailed,
        Grant::View,
        Grant::Edit,
        Grant::Manage,
        Grant::Supervise,
        Grant::ManageSupervision,
        Grant::SupportActions,
        Grant::AdminSupportActions,
        Grant::ViewDeletedBoards,
    ];

    /// Wire name of this grant
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewExistence => "view_existence",
            Self::ViewDetailed => "view_detailed",
            Self::View => "view",
            Self::Edit => "edit",
            Self::Manage => "manage",
            Self::Supervise => "supervise",
            Self::ManageSupervision => "manage_supervision",
            Self::SupportActions => "support_actions",
            Self::AdminSupportActions => "admin_support_actions",
            Self::ViewDeletedBoards => "view_deleted_boards",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view_existence" => Some(Self::ViewExistence),
            "view_detailed" => Some(Self::ViewDetailed),
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            "manage" => Some(Self::Manage),
            "supervise" => Some(Self::Supervise),
            "manage_supervision" => Some(Self::ManageSupervision),
            "support_actions" => Some(Self::SupportActions),
            "admin_support_actions" => Some(Self::AdminSupportActions),
            "view_deleted_boards" => Some(Self::ViewDeletedBoards),
            _ => None,
        }
    }
}

/// Role kinds a subject can hold against an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    /// Manager with supervisory rights over org members
    FullManager,
    /// Reduced manager role without supervisory rights
    AssistantManager,
    /// Accepted supervisor
    Supervisor,
    /// Supervisor invitation awaiting acceptance; existence only
    PendingSupervisor,
}

impl RoleKind {
    /// Grants contributed over a non-pending member of the organization
    pub fn grants_over_member(self) -> &'static [Grant] {
        match self {
            Self::FullManager => &[
                Grant::ViewDetailed,
                Grant::Supervise,
                Grant::ManageSupervision,
                Grant::SupportActions,
                Grant::ViewDeletedBoards,
            ],
            Self::Supervisor => &[Grant::ViewDetailed, Grant::Supervise],
            Self::AssistantManager | Self::PendingSupervisor => &[],
        }
    }

    /// Grants contributed over a non-pending supervisor of the organization
    pub fn grants_over_supervisor(self) -> &'static [Grant] {
        match self {
            Self::FullManager => &[
                Grant::ViewDetailed,
                Grant::Supervise,
                Grant::ManageSupervision,
            ],
            Self::AssistantManager | Self::Supervisor | Self::PendingSupervisor => &[],
        }
    }

    /// Grants contributed over the organization itself
    pub fn grants_over_org(self) -> &'static [Grant] {
        match self {
            Self::FullManager => &[Grant::View, Grant::Edit, Grant::Manage],
            Self::AssistantManager => &[Grant::View, Grant::Edit],
            Self::Supervisor | Self::PendingSupervisor => &[],
        }
    }
}

/// Grants an admin organization's full manager holds over every user
/// system-wide, regardless of that user's own memberships
pub const ADMIN_MANAGER_GRANTS: &[Grant] = &[
    Grant::ViewDetailed,
    Grant::Supervise,
    Grant::ManageSupervision,
    Grant::SupportActions,
    Grant::AdminSupportActions,
    Grant::ViewDeletedBoards,
];

/// Every role the subject holds against the given organization
pub fn roles_for(subject: &User, org: OrgId) -> Vec<RoleKind> {
    let mut roles = Vec::new();
    if let Some(manager) = subject.manager_for.get(&org) {
        roles.push(if manager.full_manager {
            RoleKind::FullManager
        } else {
            RoleKind::AssistantManager
        });
    }
    if let Some(supervisor) = subject.supervisor_for.get(&org) {
        roles.push(if supervisor.pending {
            RoleKind::PendingSupervisor
        } else {
            RoleKind::Supervisor
        });
    }
    roles
}
