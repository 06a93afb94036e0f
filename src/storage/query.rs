//! Row filters and ordering
//!
//! Predicates are evaluated against the JSON form of a row, using the same
//! column names the backend uses.

use std::cmp::Ordering;

use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::UserId;

/// Conjunction of `column = value` predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Rows owned by `owner`
    pub fn owner(owner: &UserId) -> Self {
        Self::all().eq("user_id", owner)
    }

    /// The row with primary key `id`
    pub fn id(id: Uuid) -> Self {
        Self::all().eq("id", id)
    }

    /// Add an equality predicate
    pub fn eq(mut self, column: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.conditions.push((column.to_string(), value));
        self
    }

    /// The predicates, in insertion order
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Check a row against every predicate
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| row.get(column).unwrap_or(&Value::Null) == expected)
    }
}

/// Sort order on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    /// Ascending order on `column`
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    /// Descending order on `column`
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }

    /// Compare two rows on this column; nulls sort first
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let left = a.get(&self.column).unwrap_or(&Value::Null);
        let right = b.get(&self.column).unwrap_or(&Value::Null);
        let ord = compare_values(left, right);
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        // Timestamps carry varying fraction digits, so compare them as instants
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let row = json!({"user_id": "u1", "service_name": "OpenAI"});

        assert!(Filter::all().matches(&row));
        assert!(Filter::owner(&UserId::new("u1")).matches(&row));
        assert!(!Filter::owner(&UserId::new("u2")).matches(&row));
        assert!(Filter::owner(&UserId::new("u1"))
            .eq("service_name", "OpenAI")
            .matches(&row));
        assert!(!Filter::all().eq("missing", "x").matches(&row));
    }

    #[test]
    fn test_order_compare() {
        let older = json!({"created_at": "2024-01-01T00:00:00Z"});
        let newer = json!({"created_at": "2024-06-01T00:00:00Z"});

        assert_eq!(Order::asc("created_at").compare(&older, &newer), Ordering::Less);
        assert_eq!(
            Order::desc("created_at").compare(&older, &newer),
            Ordering::Greater
        );
    }

    #[test]
    fn test_nulls_sort_first() {
        let none = json!({});
        let some = json!({"name": "a"});
        assert_eq!(Order::asc("name").compare(&none, &some), Ordering::Less);
    }

    #[test]
    fn test_timestamps_compare_by_instant() {
        let older = json!({"created_at": "2024-01-01T12:00:00Z"});
        let newer = json!({"created_at": "2024-01-01T12:00:00.500Z"});
        assert_eq!(Order::desc("created_at").compare(&newer, &older), Ordering::Less);

        let millis = json!({"created_at": "2024-01-01T12:00:00.120Z"});
        let micros = json!({"created_at": "2024-01-01T12:00:00.120001+00:00"});
        assert_eq!(Order::asc("created_at").compare(&millis, &micros), Ordering::Less);
    }
}
