//! Database models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One employee-on-project assignment period.
///
/// The natural key is the whole record: `(employee_id, project_id, date_from, date_to)`.
/// Both dates are inclusive. A record whose `date_from` is after its `date_to` is
/// stored as-is and simply never intersects anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub employee_id: i64,
    pub project_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl AssignmentRecord {
    pub fn new(employee_id: i64, project_id: i64, date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            employee_id,
            project_id,
            date_from,
            date_to,
        }
    }
}

/// Order-independent identity of two employees.
///
/// Always holds `low <= high`, so `(a, b)` and `(b, a)` map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: i64,
    high: i64,
}

impl PairKey {
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }
}

/// Result of the longest-collaboration query.
///
/// All-zero is the "no collaboration found" sentinel, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongestCollaboration {
    pub emp1_id: i64,
    pub emp2_id: i64,
    pub total_days: i64,
}

impl LongestCollaboration {
    /// The `{0, 0, 0}` sentinel
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_pair(pair: PairKey, total_days: i64) -> Self {
        Self {
            emp1_id: pair.low(),
            emp2_id: pair.high(),
            total_days,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(PairKey::new(218, 143), PairKey::new(143, 218));
        let key = PairKey::new(218, 143);
        assert_eq!(key.low(), 143);
        assert_eq!(key.high(), 218);
    }

    #[test]
    fn test_pair_key_does_not_collide_like_string_keys() {
        // Concatenated without a separator both would read "123"
        assert_ne!(PairKey::new(1, 23), PairKey::new(12, 3));
    }

    #[test]
    fn test_sentinel_serializes_camel_case() {
        let json = serde_json::to_value(LongestCollaboration::none()).unwrap();
        assert_eq!(json, serde_json::json!({"emp1Id": 0, "emp2Id": 0, "totalDays": 0}));
        assert!(LongestCollaboration::none().is_none());
    }

    #[test]
    fn test_from_pair_orders_ids() {
        let result = LongestCollaboration::from_pair(PairKey::new(148, 143), 31);
        assert_eq!(result.emp1_id, 143);
        assert_eq!(result.emp2_id, 148);
        assert_eq!(result.total_days, 31);
        assert!(!result.is_none());
    }
}
