use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Household composition of a group. Counts are people, not servings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub adults: u32,
    pub teens: u32,
    pub kids: u32,
    pub toddlers: u32,
}

const FIELDS: [&str; 4] = ["adults", "teens", "kids", "toddlers"];

impl Demographics {
    pub fn total_people(&self) -> u32 {
        self.adults
            .saturating_add(self.teens)
            .saturating_add(self.kids)
            .saturating_add(self.toddlers)
    }

    /// Scalar serving-scale factor: adults 1.0, teens 1.2, kids 0.7,
    /// toddlers 0.4, rounded to one decimal. Always recomputed from the
    /// source counts, never cached alongside them.
    pub fn adult_equivalent(&self) -> f64 {
        let raw = self.adults as f64 * 1.0
            + self.teens as f64 * 1.2
            + self.kids as f64 * 0.7
            + self.toddlers as f64 * 0.4;
        (raw * 10.0).round() / 10.0
    }

    /// Build from the untyped form the web layer submits, accumulating every
    /// field error rather than stopping at the first.
    pub fn from_value(value: &Value) -> Result<Self, Vec<String>> {
        let errors = validate_demographics(value);
        if !errors.is_empty() {
            return Err(errors);
        }
        let count = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0)
        };
        Ok(Self {
            adults: count("adults"),
            teens: count("teens"),
            kids: count("kids"),
            toddlers: count("toddlers"),
        })
    }
}

/// Validate the untyped demographics object. One error string per malformed
/// field; the "at least one person" error fires only when every count is
/// zero. Errors accumulate.
pub fn validate_demographics(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let mut total: u64 = 0;
    let mut all_fields_ok = true;

    for field in FIELDS {
        match value.get(field) {
            None | Some(Value::Null) => {
                errors.push(format!("{field} is required"));
                all_fields_ok = false;
            }
            Some(v) => match v.as_u64() {
                // Anything past u32 would truncate on the way into
                // `Demographics` and could fake an empty group as populated.
                Some(n) if u32::try_from(n).is_err() => {
                    errors.push(format!("{field} is too large"));
                    all_fields_ok = false;
                }
                Some(n) => total += n,
                None => {
                    if v.as_i64().is_some() || v.as_f64().map(|f| f < 0.0).unwrap_or(false) {
                        errors.push(format!("{field} must not be negative"));
                    } else {
                        errors.push(format!("{field} must be a whole number"));
                    }
                    all_fields_ok = false;
                }
            },
        }
    }

    if all_fields_ok && total == 0 {
        errors.push("group must have at least one person".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adult_equivalent_weighted_sum() {
        let d = Demographics {
            adults: 2,
            teens: 1,
            kids: 1,
            toddlers: 1,
        };
        assert_eq!(d.adult_equivalent(), 4.3);
    }

    #[test]
    fn adult_equivalent_rounds_to_one_decimal() {
        let d = Demographics {
            adults: 2,
            teens: 1,
            kids: 2,
            toddlers: 0,
        };
        assert_eq!(d.adult_equivalent(), 4.6);
    }

    #[test]
    fn adult_equivalent_is_deterministic() {
        let d = Demographics {
            adults: 1,
            teens: 3,
            kids: 0,
            toddlers: 2,
        };
        assert_eq!(d.adult_equivalent(), d.adult_equivalent());
    }

    #[test]
    fn valid_demographics_pass() {
        let errors =
            validate_demographics(&json!({"adults": 2, "teens": 0, "kids": 1, "toddlers": 0}));
        assert!(errors.is_empty());
    }

    #[test]
    fn empty_group_is_rejected() {
        let errors =
            validate_demographics(&json!({"adults": 0, "teens": 0, "kids": 0, "toddlers": 0}));
        assert_eq!(errors, vec!["group must have at least one person"]);
    }

    #[test]
    fn negative_and_fractional_counts_each_get_one_error() {
        let errors =
            validate_demographics(&json!({"adults": -1, "teens": 1.5, "kids": 0, "toddlers": 0}));
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&"adults must not be negative".to_string()));
        assert!(errors.contains(&"teens must be a whole number".to_string()));
    }

    #[test]
    fn counts_past_u32_are_rejected_not_truncated() {
        // 2^32 must not wrap to zero people and sneak past the
        // at-least-one-person check.
        let value = json!({"adults": 4294967296u64, "teens": 0, "kids": 0, "toddlers": 0});
        let errors = validate_demographics(&value);
        assert_eq!(errors, vec!["adults is too large"]);
        assert!(Demographics::from_value(&value).is_err());
    }

    #[test]
    fn total_people_saturates_instead_of_overflowing() {
        let d = Demographics {
            adults: u32::MAX,
            teens: 1,
            kids: 0,
            toddlers: 0,
        };
        assert_eq!(d.total_people(), u32::MAX);
    }

    #[test]
    fn missing_field_is_reported_per_field() {
        let errors = validate_demographics(&json!({"adults": 1}));
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"teens is required".to_string()));
    }

    #[test]
    fn from_value_round_trips_counts() {
        let d = Demographics::from_value(&json!({"adults": 2, "teens": 1, "kids": 2, "toddlers": 0}))
            .expect("valid demographics");
        assert_eq!(d.total_people(), 5);
        assert_eq!(d.adult_equivalent(), 4.6);
    }

    #[test]
    fn from_value_collects_errors() {
        let errors =
            Demographics::from_value(&json!({"adults": "two", "teens": 0, "kids": 0, "toddlers": 0}))
                .unwrap_err();
        assert_eq!(errors, vec!["adults must be a whole number"]);
    }
}
