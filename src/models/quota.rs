use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_LIMIT: u32 = 50;

/// Daily generation allowance, persisted as `{dailyLimit, usedToday, resetAt}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuota {
    pub daily_limit: u32,
    pub used_today: u32,
    pub reset_at: DateTime<Utc>,
}

impl UserQuota {
    /// Fresh allowance with the first reset 24 hours from `now`
    pub fn new(daily_limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            daily_limit,
            used_today: 0,
            reset_at: now + Duration::days(1),
        }
    }

    /// Validate state read back from storage.
    ///
    /// A zero limit is unusable and rejected; usage above the limit is clamped.
    pub fn sanitize(mut self) -> Option<Self> {
        if self.daily_limit == 0 {
            return None;
        }
        self.used_today = self.used_today.min(self.daily_limit);
        Some(self)
    }

    /// Zero usage once `now` reaches `reset_at`. Returns true when a rollover happened.
    ///
    /// The next reset is the start of the calendar day after `now` in `tz`,
    /// never `reset_at + 1 day`, so a long idle gap cannot leave it in the past.
    pub fn reset_if_needed<Tz: TimeZone>(&mut self, now: DateTime<Utc>, tz: &Tz) -> bool {
        if now < self.reset_at {
            return false;
        }
        self.used_today = 0;
        self.reset_at = start_of_next_day(now, tz);
        true
    }

    pub fn can_generate(&self) -> bool {
        self.used_today < self.daily_limit
    }

    /// Take one unit. Refuses silently at the limit.
    pub fn consume(&mut self) -> bool {
        if !self.can_generate() {
            return false;
        }
        self.used_today += 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.used_today)
    }

    /// Share of the allowance used, in `[0, 1]`
    pub fn usage_fraction(&self) -> f64 {
        if self.daily_limit == 0 {
            return 0.0;
        }
        (f64::from(self.used_today) / f64::from(self.daily_limit)).clamp(0.0, 1.0)
    }

    pub fn time_until_reset(&self, now: DateTime<Utc>) -> Duration {
        (self.reset_at - now).max(Duration::zero())
    }

    /// Change the allowance (plan upgrade or config change), keeping usage within it
    pub fn set_daily_limit(&mut self, daily_limit: u32) {
        self.daily_limit = daily_limit.max(1);
        self.used_today = self.used_today.min(self.daily_limit);
    }
}

/// Midnight at the start of the day following `now`, as seen in `tz`
pub fn start_of_next_day<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(tz).date_naive();
    local_date
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|start| start.with_timezone(&Utc))
        // Midnight can fall into a DST gap in a few zones
        .unwrap_or_else(|| now + Duration::days(1))
}
