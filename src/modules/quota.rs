use chrono::{DateTime, Duration, Local, Utc};
use std::sync::Arc;

use super::storage::{Persisted, StateStorage};
use crate::models::UserQuota;
use crate::utils::Clock;

/// Capability consulted before entering a quota-gated destination
pub trait GenerationGate {
    fn can_generate(&mut self) -> bool;
}

/// Daily generation allowance bound to a clock and persisted after each change
pub struct QuotaTracker {
    quota: UserQuota,
    storage: StateStorage,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    /// Load persisted quota, or start a fresh allowance of `daily_limit`
    pub fn load(storage: StateStorage, clock: Arc<dyn Clock>, daily_limit: u32) -> Self {
        let quota = storage.load_quota_state().unwrap_or_else(|| {
            tracing::info!("No usable quota state, starting with daily limit {}", daily_limit);
            UserQuota::new(daily_limit.max(1), clock.now())
        });
        Self {
            quota,
            storage,
            clock,
        }
    }

    pub fn with_quota(quota: UserQuota, storage: StateStorage, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota,
            storage,
            clock,
        }
    }

    pub fn quota(&self) -> &UserQuota {
        &self.quota
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Roll usage over once the reset time has passed. Returns true on rollover.
    pub fn reset_if_needed(&mut self) -> bool {
        let now = self.clock.now();
        if !self.quota.reset_if_needed(now, &Local) {
            return false;
        }
        tracing::info!(
            "Quota rolled over, next reset at {}",
            self.quota.reset_at.to_rfc3339()
        );
        // Read paths like can_generate() have no caller to report to; save() has
        // already logged, and the next mutation rewrites the whole state
        if self.save().is_err() {
            tracing::debug!("Rollover kept in memory until the next successful save");
        }
        true
    }

    /// Take one generation unit; `value` is false when the allowance is spent
    pub fn consume(&mut self) -> Persisted<bool> {
        self.reset_if_needed();
        if !self.quota.consume() {
            tracing::debug!("Quota exhausted, consume refused");
            return Persisted::new(false, Ok(()));
        }
        tracing::debug!(
            "Consumed generation unit ({}/{})",
            self.quota.used_today,
            self.quota.daily_limit
        );
        Persisted::new(true, self.save())
    }

    pub fn remaining(&self) -> u32 {
        self.quota.remaining()
    }

    pub fn usage_fraction(&self) -> f64 {
        self.quota.usage_fraction()
    }

    pub fn time_until_reset(&self) -> Duration {
        self.quota.time_until_reset(self.clock.now())
    }

    /// Raise or lower the allowance, e.g. after a plan upgrade
    pub fn set_daily_limit(&mut self, daily_limit: u32) -> Persisted<()> {
        self.quota.set_daily_limit(daily_limit);
        tracing::info!("Daily limit set to {}", self.quota.daily_limit);
        Persisted::new((), self.save())
    }

    fn save(&self) -> crate::error::AppResult<()> {
        let saved = self.storage.save_quota_state(&self.quota);
        if let Err(e) = &saved {
            tracing::warn!("Failed to persist quota state: {}", e);
        }
        saved
    }
}

impl GenerationGate for QuotaTracker {
    fn can_generate(&mut self) -> bool {
        self.reset_if_needed();
        self.quota.can_generate()
    }
}
