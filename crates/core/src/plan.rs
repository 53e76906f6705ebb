//! Subscription plans and their per-day action limits.
//!
//! Plans are reference data: seeded once by migration and changed only
//! through the administrative update endpoint. Each plan caps three action
//! categories per calendar day. The stored value `-1` means unlimited and is
//! lifted into [`DailyLimit::Unlimited`] before any comparison happens.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Plan assumed for users whose `subscription_plan` is unset.
pub const DEFAULT_PLAN: &str = "free";

/// Raw storage value meaning "no daily cap".
pub const UNLIMITED: i32 = -1;

/// Per-category limit applied when the plan row cannot be read.
pub const FREE_FALLBACK_LIMIT: i32 = 3;

// ---------------------------------------------------------------------------
// PlanTier
// ---------------------------------------------------------------------------

/// The known subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Premium,
}

impl PlanTier {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }

    /// Parse a stored plan name. Returns `None` for names outside the three tiers.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "free" => Some(PlanTier::Free),
            "pro" => Some(PlanTier::Pro),
            "premium" => Some(PlanTier::Premium),
            _ => None,
        }
    }

    /// Premium is unlimited in every category regardless of its stored limits.
    pub fn is_premium(name: &str) -> bool {
        Self::parse(name) == Some(PlanTier::Premium)
    }
}

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// A rate-limited action category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Interviews,
    Results,
    Retakes,
}

impl ActionType {
    pub const ALL: [ActionType; 3] = [
        ActionType::Interviews,
        ActionType::Results,
        ActionType::Retakes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Interviews => "interviews",
            ActionType::Results => "results",
            ActionType::Retakes => "retakes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interviews" => Some(ActionType::Interviews),
            "results" => Some(ActionType::Results),
            "retakes" => Some(ActionType::Retakes),
            _ => None,
        }
    }

    /// Counter column in `user_usage` tracking this category.
    pub fn usage_column(&self) -> &'static str {
        match self {
            ActionType::Interviews => "interviews_used",
            ActionType::Results => "results_viewed",
            ActionType::Retakes => "retakes_done",
        }
    }
}

// ---------------------------------------------------------------------------
// DailyLimit
// ---------------------------------------------------------------------------

/// A per-day cap for one action category.
///
/// Serialized as the raw integer (`-1` for unlimited) so API clients see the
/// same value that is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum DailyLimit {
    Unlimited,
    Capped(i32),
}

impl DailyLimit {
    /// Whether one more unit is allowed given `used` units today.
    ///
    /// Strictly less-than: a user at exactly the cap is blocked.
    pub fn allows(&self, used: i32) -> bool {
        match self {
            DailyLimit::Unlimited => true,
            DailyLimit::Capped(cap) => used < *cap,
        }
    }

    /// Units left today, or `None` when unlimited.
    pub fn remaining(&self, used: i32) -> Option<i32> {
        match self {
            DailyLimit::Unlimited => None,
            DailyLimit::Capped(cap) => Some((cap - used).max(0)),
        }
    }
}

impl From<i32> for DailyLimit {
    fn from(raw: i32) -> Self {
        if raw == UNLIMITED {
            DailyLimit::Unlimited
        } else {
            DailyLimit::Capped(raw)
        }
    }
}

impl From<DailyLimit> for i32 {
    fn from(limit: DailyLimit) -> Self {
        match limit {
            DailyLimit::Unlimited => UNLIMITED,
            DailyLimit::Capped(cap) => cap,
        }
    }
}

// ---------------------------------------------------------------------------
// PlanLimits
// ---------------------------------------------------------------------------

/// The daily limits of a named plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub name: String,
    pub interviews_per_day: DailyLimit,
    pub results_per_day: DailyLimit,
    pub retakes_per_day: DailyLimit,
}

impl PlanLimits {
    /// Hardcoded free tier used when the plan lookup fails.
    pub fn free_fallback() -> Self {
        let cap = DailyLimit::Capped(FREE_FALLBACK_LIMIT);
        Self {
            name: DEFAULT_PLAN.to_string(),
            interviews_per_day: cap,
            results_per_day: cap,
            retakes_per_day: cap,
        }
    }

    pub fn limit_for(&self, action: ActionType) -> DailyLimit {
        match action {
            ActionType::Interviews => self.interviews_per_day,
            ActionType::Results => self.results_per_day,
            ActionType::Retakes => self.retakes_per_day,
        }
    }
}

/// Validate a raw daily limit supplied by an administrator.
///
/// Accepts any non-negative cap or the `-1` unlimited sentinel.
pub fn validate_daily_limit(value: i32, field: &str) -> Result<(), CoreError> {
    if value < UNLIMITED {
        return Err(CoreError::Validation(format!(
            "{field} must be -1 (unlimited) or a non-negative integer, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_maps_to_unlimited() {
        assert_eq!(DailyLimit::from(-1), DailyLimit::Unlimited);
        assert_eq!(DailyLimit::from(0), DailyLimit::Capped(0));
        assert_eq!(i32::from(DailyLimit::Unlimited), -1);
    }

    #[test]
    fn capped_limit_is_strict_less_than() {
        let limit = DailyLimit::Capped(50);
        assert!(limit.allows(49));
        assert!(!limit.allows(50));
        assert!(!limit.allows(51));
    }

    #[test]
    fn zero_cap_blocks_everything() {
        assert!(!DailyLimit::Capped(0).allows(0));
    }

    #[test]
    fn unlimited_allows_any_usage() {
        assert!(DailyLimit::Unlimited.allows(0));
        assert!(DailyLimit::Unlimited.allows(i32::MAX));
        assert_eq!(DailyLimit::Unlimited.remaining(10_000), None);
    }

    #[test]
    fn remaining_never_negative() {
        assert_eq!(DailyLimit::Capped(3).remaining(1), Some(2));
        assert_eq!(DailyLimit::Capped(3).remaining(7), Some(0));
    }

    #[test]
    fn limit_serializes_as_raw_integer() {
        let json = serde_json::to_string(&PlanLimits::free_fallback()).unwrap();
        assert!(json.contains("\"interviews_per_day\":3"));

        let parsed: DailyLimit = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, DailyLimit::Unlimited);
    }

    #[test]
    fn free_fallback_is_three_per_category() {
        let plan = PlanLimits::free_fallback();
        assert_eq!(plan.name, "free");
        for action in ActionType::ALL {
            assert_eq!(plan.limit_for(action), DailyLimit::Capped(3));
        }
    }

    #[test]
    fn premium_detection() {
        assert!(PlanTier::is_premium("premium"));
        assert!(!PlanTier::is_premium("pro"));
        assert!(!PlanTier::is_premium("Premium"));
    }

    #[test]
    fn action_round_trips_through_path_string() {
        for action in ActionType::ALL {
            assert_eq!(ActionType::parse(action.as_str()), Some(action));
        }
        assert_eq!(ActionType::parse("uploads"), None);
    }

    #[test]
    fn validate_daily_limit_bounds() {
        assert!(validate_daily_limit(-1, "results_per_day").is_ok());
        assert!(validate_daily_limit(0, "results_per_day").is_ok());
        assert!(validate_daily_limit(-2, "results_per_day").is_err());
    }
}
