//! Free-trial window evaluation.
//!
//! A user is in their trial while `now < created_at + period`. When the
//! account cannot be read the gate stays open: availability wins over
//! strictness here, and the outcome says so via [`TrialOutcome::Degraded`].

use crate::db::Database;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Default trial length.
pub const DEFAULT_TRIAL_DAYS: u32 = 30;

/// Trial state as shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialInfo {
    pub is_trial_active: bool,
    pub trial_days_left: u32,
}

impl TrialInfo {
    /// Active with the whole period remaining.
    pub fn full(period_days: u32) -> Self {
        Self {
            is_trial_active: true,
            trial_days_left: period_days,
        }
    }
}

/// Why the permissive default was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// No account row for the user.
    UserNotFound,
    /// The account row has no usable creation timestamp.
    InvalidTimestamp(String),
    /// The store could not be reached.
    StoreUnavailable(String),
}

/// Result of checking a user's trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Computed from the account's creation time.
    Evaluated(TrialInfo),
    /// Permissive default because the account could not be evaluated.
    Degraded(TrialInfo, DegradedReason),
}

impl TrialOutcome {
    pub fn info(&self) -> TrialInfo {
        match self {
            Self::Evaluated(info) | Self::Degraded(info, _) => *info,
        }
    }

    pub fn is_active(&self) -> bool {
        self.info().is_trial_active
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }
}

/// Pure trial computation.
pub fn evaluate(created_at: DateTime<Utc>, now: DateTime<Utc>, period_days: u32) -> TrialInfo {
    let trial_end = created_at + Duration::days(i64::from(period_days));
    let is_trial_active = now < trial_end;
    let trial_days_left = if is_trial_active {
        (trial_end - now).num_days().max(0) as u32
    } else {
        0
    };

    TrialInfo {
        is_trial_active,
        trial_days_left,
    }
}

/// Parse an account timestamp. Zone-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Looks up accounts and evaluates their trial.
#[derive(Clone)]
pub struct TrialGate {
    db: Arc<dyn Database>,
    period_days: u32,
}

impl TrialGate {
    pub fn new(db: Arc<dyn Database>, period_days: u32) -> Self {
        Self { db, period_days }
    }

    pub fn period_days(&self) -> u32 {
        self.period_days
    }

    /// Check a user's trial as of now.
    pub async fn check(&self, user_id: &str) -> TrialOutcome {
        self.check_at(user_id, Utc::now()).await
    }

    /// Check a user's trial as of `now`.
    pub async fn check_at(&self, user_id: &str, now: DateTime<Utc>) -> TrialOutcome {
        let reason = match self.db.get_user(user_id).await {
            Ok(Some(user)) => match user.created_at.as_deref().and_then(parse_timestamp) {
                Some(created_at) => {
                    return TrialOutcome::Evaluated(evaluate(created_at, now, self.period_days));
                }
                None => DegradedReason::InvalidTimestamp(user.created_at.unwrap_or_default()),
            },
            Ok(None) => DegradedReason::UserNotFound,
            Err(e) => DegradedReason::StoreUnavailable(e.to_string()),
        };

        warn!(user_id, ?reason, "trial check degraded; treating trial as active");
        TrialOutcome::Degraded(TrialInfo::full(self.period_days), reason)
    }
}
