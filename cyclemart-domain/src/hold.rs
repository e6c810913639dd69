use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cycle::CycleSummary;
use crate::error::HoldError;

/// Default hold window. `hold_end_time` is always exactly this far past
/// `created_at`; there is no extension operation.
pub const DEFAULT_HOLD_MINUTES: i64 = 20;

/// Contact details captured with each hold. A value snapshot, not a reference
/// to a user account; the same person re-enters these for every hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    #[serde(rename = "customer_name")]
    pub full_name: String,
    #[serde(rename = "customer_email")]
    pub email: String,
    #[serde(rename = "customer_phone")]
    pub phone: String,
    /// Provisional allotment number issued by the campus.
    pub allotment_number: String,
}

impl Requester {
    /// All four fields are required; no partial holds.
    pub fn validate(&self) -> Result<(), HoldError> {
        if self.full_name.trim().is_empty() {
            return Err(HoldError::validation("name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(HoldError::validation("email is required"));
        }
        if !self.email.contains('@') {
            return Err(HoldError::validation("email is not a valid address"));
        }
        if self.phone.trim().is_empty() {
            return Err(HoldError::validation("phone is required"));
        }
        if self.allotment_number.trim().is_empty() {
            return Err(HoldError::validation("allotment number is required"));
        }
        Ok(())
    }
}

/// A time-bounded reservation granting one requester exclusive first-claim on
/// one cycle. Rows are never deleted by core logic; `is_active` flips false
/// exactly once (explicit release, expiry sweep, or admin override) and never
/// back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub id: Uuid,
    pub cycle_id: Uuid,
    #[serde(flatten)]
    pub requester: Requester,
    pub created_at: DateTime<Utc>,
    pub hold_end_time: DateTime<Utc>,
    pub is_active: bool,
}

impl Hold {
    pub fn new(cycle_id: Uuid, requester: Requester, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_id,
            requester,
            created_at: now,
            hold_end_time: now + window,
            is_active: true,
        }
    }

    /// Whether this hold still blocks its cycle. An active hold past its end
    /// time is logically expired even before the sweep flips the flag.
    pub fn blocks(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.hold_end_time > now
    }

    pub fn remaining_time(&self, now: DateTime<Utc>) -> RemainingTime {
        let left = self.hold_end_time - now;
        if left <= Duration::zero() {
            return RemainingTime::Expired;
        }
        let secs = left.num_seconds();
        RemainingTime::Running {
            minutes: secs / 60,
            seconds: secs % 60,
        }
    }
}

/// Countdown remainder for a hold. Pure value; cheap enough for a UI timer to
/// recompute every second from an already-fetched hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTime {
    Running { minutes: i64, seconds: i64 },
    Expired,
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingTime::Running { minutes, seconds } => write!(f, "{}:{:02}", minutes, seconds),
            RemainingTime::Expired => write!(f, "Expired"),
        }
    }
}

/// An active hold enriched with its cycle's display attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldWithCycle {
    #[serde(flatten)]
    pub hold: Hold,
    pub cycle: CycleSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requester() -> Requester {
        Requester {
            full_name: "Asha Rao".to_string(),
            email: "asha@campus.edu".to_string(),
            phone: "9876543210".to_string(),
            allotment_number: "AL-2041".to_string(),
        }
    }

    #[test]
    fn end_time_is_exactly_window_after_creation() {
        let now = Utc::now();
        let hold = Hold::new(Uuid::new_v4(), requester(), now, Duration::minutes(20));
        assert_eq!(hold.hold_end_time - hold.created_at, Duration::minutes(20));
        assert!(hold.is_active);
    }

    #[test]
    fn expired_active_hold_does_not_block() {
        let now = Utc::now();
        let mut hold = Hold::new(Uuid::new_v4(), requester(), now, Duration::minutes(20));
        assert!(hold.blocks(now));
        assert!(!hold.blocks(now + Duration::minutes(21)));

        hold.is_active = false;
        assert!(!hold.blocks(now));
    }

    #[test]
    fn remaining_time_formats_minutes_and_padded_seconds() {
        let now = Utc::now();
        let hold = Hold::new(Uuid::new_v4(), requester(), now, Duration::minutes(20));

        let at = now + Duration::seconds(18 * 60 + 55); // 1:05 left
        assert_eq!(hold.remaining_time(at).to_string(), "1:05");

        let at = now + Duration::seconds(60); // 19:00 left
        assert_eq!(hold.remaining_time(at).to_string(), "19:00");
    }

    #[test]
    fn remaining_time_is_expired_at_and_past_the_boundary() {
        let now = Utc::now();
        let hold = Hold::new(Uuid::new_v4(), requester(), now, Duration::minutes(20));
        assert_eq!(hold.remaining_time(now + Duration::minutes(20)), RemainingTime::Expired);
        assert_eq!(hold.remaining_time(now + Duration::hours(2)), RemainingTime::Expired);
        assert_eq!(hold.remaining_time(now + Duration::minutes(20)).to_string(), "Expired");
    }

    #[test]
    fn hold_serializes_with_customer_field_names() {
        let hold = Hold::new(Uuid::new_v4(), requester(), Utc::now(), Duration::minutes(20));
        let json = serde_json::to_value(&hold).unwrap();

        assert_eq!(json["customer_name"], "Asha Rao");
        assert_eq!(json["customer_email"], "asha@campus.edu");
        assert_eq!(json["customer_phone"], "9876543210");
        assert_eq!(json["allotment_number"], "AL-2041");
        assert!(json.get("full_name").is_none());

        let back: Hold = serde_json::from_value(json).unwrap();
        assert_eq!(back, hold);
    }

    #[test]
    fn requester_rejects_missing_or_malformed_fields() {
        let mut r = requester();
        assert!(r.validate().is_ok());

        r.full_name = "   ".to_string();
        assert!(matches!(r.validate(), Err(HoldError::Validation(_))));

        let mut r = requester();
        r.email = "not-an-address".to_string();
        assert!(matches!(r.validate(), Err(HoldError::Validation(_))));

        let mut r = requester();
        r.allotment_number = String::new();
        assert!(matches!(r.validate(), Err(HoldError::Validation(_))));
    }
}
