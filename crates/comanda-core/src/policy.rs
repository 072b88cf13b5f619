//! Runtime policy knobs for the order store and lot ledger.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use ts_rs::TS;

use crate::error::ValidationError;

/// Origin id used for takeaway orders when none is configured.
pub const DEFAULT_TAKEAWAY_ORIGIN: &str = "TAKEAWAY";

/// What a deduction does when lots hold less than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OversellPolicy {
    /// Drain lots to zero, log the shortfall, keep the kitchen moving.
    #[default]
    Allow,
    /// Fail the whole mutation with `InsufficientStock`.
    Reject,
}

impl FromStr for OversellPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(OversellPolicy::Allow),
            "reject" => Ok(OversellPolicy::Reject),
            other => Err(ValidationError::InvalidFormat {
                field: "oversell".to_string(),
                reason: format!("expected allow or reject, got '{}'", other),
            }),
        }
    }
}

/// What a mutation does when a recipe references an ingredient that no
/// longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MissingIngredientPolicy {
    /// Log and skip that ingredient; every other delta is still applied.
    #[default]
    SkipAndLog,
    /// Fail the mutation with `IngredientNotFound`.
    Abort,
}

impl FromStr for MissingIngredientPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "skip_and_log" => Ok(MissingIngredientPolicy::SkipAndLog),
            "abort" => Ok(MissingIngredientPolicy::Abort),
            other => Err(ValidationError::InvalidFormat {
                field: "missing_ingredient".to_string(),
                reason: format!("expected skip or abort, got '{}'", other),
            }),
        }
    }
}

/// Policies applied by the order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePolicy {
    pub oversell: OversellPolicy,
    pub missing_ingredient: MissingIngredientPolicy,
    /// Origin that may hold any number of active orders at once.
    pub takeaway_origin: String,
    /// Upper bound on waiting for an order or ingredient lock.
    pub lock_timeout: Duration,
}

impl Default for StorePolicy {
    fn default() -> Self {
        StorePolicy {
            oversell: OversellPolicy::Allow,
            missing_ingredient: MissingIngredientPolicy::SkipAndLog,
            takeaway_origin: DEFAULT_TAKEAWAY_ORIGIN.to_string(),
            lock_timeout: Duration::from_secs(10),
        }
    }
}

impl StorePolicy {
    pub fn is_takeaway(&self, origin_id: &str) -> bool {
        origin_id == self.takeaway_origin
    }

    pub fn with_oversell(mut self, oversell: OversellPolicy) -> Self {
        self.oversell = oversell;
        self
    }

    pub fn with_missing_ingredient(mut self, policy: MissingIngredientPolicy) -> Self {
        self.missing_ingredient = policy;
        self
    }

    pub fn with_takeaway_origin(mut self, origin: impl Into<String>) -> Self {
        self.takeaway_origin = origin.into();
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("allow".parse::<OversellPolicy>().unwrap(), OversellPolicy::Allow);
        assert_eq!(" Reject ".parse::<OversellPolicy>().unwrap(), OversellPolicy::Reject);
        assert!("maybe".parse::<OversellPolicy>().is_err());

        assert_eq!(
            "skip".parse::<MissingIngredientPolicy>().unwrap(),
            MissingIngredientPolicy::SkipAndLog
        );
        assert_eq!(
            "abort".parse::<MissingIngredientPolicy>().unwrap(),
            MissingIngredientPolicy::Abort
        );
    }

    #[test]
    fn test_defaults() {
        let policy = StorePolicy::default();
        assert_eq!(policy.oversell, OversellPolicy::Allow);
        assert_eq!(policy.missing_ingredient, MissingIngredientPolicy::SkipAndLog);
        assert!(policy.is_takeaway("TAKEAWAY"));
        assert!(!policy.is_takeaway("T1"));
    }
}
