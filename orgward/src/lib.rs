//! orgward - multi-tenant authorization engine
//!
//! Decides, for any (subject, target, action) triple, whether an operation is
//! permitted, and manages the organization roles and per-seat license
//! accounting that feed those decisions. Permission computation is recursive
//! over organization relationships and memoized by a revision-keyed cache;
//! membership mutations bump entity revisions so stale cache entries become
//! unreachable.
//!
//! Consumed in-process: [`PermissionEngine`] for queries,
//! [`MembershipManager`] for mutations. Persistence and notification delivery
//! are collaborator seams ([`EntityStore`], [`Notifier`]).

pub mod cache;
pub mod error;
pub mod licensing;
pub mod membership;
pub mod notify;
pub mod permissions;
pub mod registry;
pub mod store;
pub mod types;

pub use cache::{CacheKey, PermissionCache};
pub use error::{AccessError, Result};
pub use licensing::{LicenseConfig, OrgSettingsUpdate, SettingsOutcome};
pub use membership::MembershipManager;
pub use notify::{MembershipEvent, Notifier, NotifyError, NullNotifier, RecordingNotifier};
pub use permissions::{PermissionEngine, PermissionMap};
pub use registry::{Grant, RoleKind};
pub use store::{EntityStore, MemoryStore};
pub use types::*;
