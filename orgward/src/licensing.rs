//! License allocation: seat capacity and subscription proration
//!
//! Sponsored membership pauses the user's personal subscription clock in
//! favor of the organization's license; removal resumes it. The grace-period
//! thresholds are empirically chosen constants carried over from production,
//! kept overridable rather than re-derived.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Organization, Subscription, User};

const WEEK_SECS: u64 = 7 * 24 * 60 * 60;

/// Tunable thresholds for subscription restoration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Remainders below this floor are considered too small to restore
    #[serde(default = "default_min_remainder")]
    pub min_remainder_secs: u64,

    /// Window granted instead of a tiny remainder, so access is not cut off
    /// abruptly after sponsorship ends
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

fn default_min_remainder() -> u64 {
    WEEK_SECS
}

fn default_grace_period() -> u64 {
    2 * WEEK_SECS
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            min_remainder_secs: default_min_remainder(),
            grace_period_secs: default_grace_period(),
        }
    }
}

impl LicenseConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::seconds(self.grace_period_secs as i64)
    }
}

/// Pause the user's personal clock for the duration of sponsorship
///
/// Records how many seconds remained so they can be restored later.
pub fn pause_subscription(user: &mut User, now: DateTime<Utc>) {
    let seconds_left = user
        .expires_at
        .map(|expires| (expires - now).num_seconds().max(0))
        .unwrap_or(0);
    user.subscription = Some(Subscription {
        org_sponsored: true,
        seconds_left,
    });
}

/// Resume the personal clock after sponsorship ends
///
/// Restores the recorded remainder when it clears the configured floor;
/// otherwise grants the fixed grace period. Subscriptions that were never
/// org-sponsored leave `expires_at` untouched. The record is cleared either
/// way.
pub fn resume_subscription(user: &mut User, now: DateTime<Utc>, config: &LicenseConfig) {
    let Some(subscription) = user.subscription.take() else {
        return;
    };
    if !subscription.org_sponsored {
        return;
    }
    let restored = if subscription.seconds_left >= config.min_remainder_secs as i64 {
        Duration::seconds(subscription.seconds_left)
    } else {
        config.grace_period()
    };
    user.expires_at = Some(now + restored);
}

/// Field updates applied through organization settings processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgSettingsUpdate {
    pub total_licenses: Option<u32>,
    pub public: Option<bool>,
}

/// Result of settings processing: either applied, or a list of field-level
/// problems with no state changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsOutcome {
    pub applied: bool,
    pub errors: Vec<String>,
}

/// Validate and apply a settings update to an organization
///
/// Validation runs before any field is written, so a failed update leaves
/// the organization untouched.
pub fn apply_settings(org: &mut Organization, update: &OrgSettingsUpdate) -> SettingsOutcome {
    let mut errors = Vec::new();
    if let Some(total) = update.total_licenses
        && total < org.used_licenses
    {
        errors.push("too few licenses, remove some users first".to_string());
    }
    if !errors.is_empty() {
        return SettingsOutcome {
            applied: false,
            errors,
        };
    }

    if let Some(total) = update.total_licenses {
        org.total_licenses = total;
    }
    if let Some(public) = update.public {
        org.public = public;
    }
    SettingsOutcome {
        applied: true,
        errors: Vec::new(),
    }
}
