//! Revision-keyed memoization of computed permission mappings
//!
//! The key embeds both parties' freshness markers, so a mutation that bumps
//! either revision makes the old entry unreachable rather than requiring
//! explicit invalidation. Unreachable entries are reclaimed in bulk when the
//! map hits its capacity.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::permissions::PermissionMap;
use crate::types::Revision;

const DEFAULT_CAPACITY: usize = 4096;

/// Composite cache key: (subject, subject revision, target, target revision)
///
/// `subject` is `None` for unauthenticated callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject: Option<(Uuid, Revision)>,
    pub target: (Uuid, Revision),
}

/// Read-through cache for [`PermissionMap`] values
pub struct PermissionCache {
    entries: RwLock<HashMap<CacheKey, PermissionMap>>,
    capacity: usize,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Look up a previously computed mapping
    pub async fn get(&self, key: &CacheKey) -> Option<PermissionMap> {
        let hit = self.entries.read().await.get(key).cloned();
        match &hit {
            Some(_) => debug!(target_id = %key.target.0, "permission cache hit"),
            None => debug!(target_id = %key.target.0, "permission cache miss"),
        }
        hit
    }

    /// Store a computed mapping
    ///
    /// Superseded keys are unreachable, so when the map fills up everything
    /// is dropped at once instead of tracking per-entry liveness.
    pub async fn insert(&self, key: CacheKey, map: PermissionMap) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!(entries = entries.len(), "permission cache full, clearing");
            entries.clear();
        }
        entries.insert(key, map);
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new()
    }
}
