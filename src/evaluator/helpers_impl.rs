//! Helper functions and methods for the Evaluator
//!
//! This module contains the coercion rules shared by operators and methods:
//! - `is_truthy` - Determine truthiness of a value
//! - `to_number` - Numeric coercion (`NaN` for anything non-numeric)
//! - `loose_equals` / `strict_equals` - `==` and `===`
//! - `compare_values` - Ordering for `<`, `>`, `<=`, `>=`
//! - `display` - Text substituted for a value in a description
//! - `format_number` - Format numeric values appropriately

use std::cmp::Ordering;

use super::{Evaluator, Value};

impl<'a> Evaluator<'a> {
    /// Determine if a value is truthy
    ///
    /// Null, false, 0, NaN and the empty string are falsy. Entities and
    /// lists (even empty ones) are truthy.
    pub(super) fn is_truthy(&self, value: &Value<'a>) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Entity(_) | Value::List(_) => true,
        }
    }

    pub(super) fn to_number(&self, value: &Value<'a>) -> f64 {
        match value {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Entity(_) | Value::List(_) => f64::NAN,
        }
    }

    pub(super) fn strict_equals(&self, left: &Value<'a>, right: &Value<'a>) -> bool {
        match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Entity(a), Value::Entity(b)) => a.same_as(b),
            _ => false,
        }
    }

    pub(super) fn loose_equals(&self, left: &Value<'a>, right: &Value<'a>) -> bool {
        match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Text(_), Value::Text(_)) | (Value::Entity(_), Value::Entity(_)) => {
                self.strict_equals(left, right)
            }
            (Value::Entity(_), _) | (_, Value::Entity(_)) => false,
            (Value::List(_), _) | (_, Value::List(_)) => false,
            _ => self.to_number(left) == self.to_number(right),
        }
    }

    /// Compare two values for ordering
    ///
    /// Two strings compare lexically; anything else compares numerically.
    /// Returns None when the comparison is undefined (NaN involved).
    pub(super) fn compare_values(&self, left: &Value<'a>, right: &Value<'a>) -> Option<Ordering> {
        if let (Value::Text(a), Value::Text(b)) = (left, right) {
            return Some(a.cmp(b));
        }
        self.to_number(left).partial_cmp(&self.to_number(right))
    }

    /// Text substituted for a value in rendered output
    pub fn display(&self, value: &Value<'a>) -> String {
        match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Entity(entity) => entity.name().to_string(),
            Value::List(items) => items
                .iter()
                .map(|item| self.display(item))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Format a number the way it would print in a description: integers without
/// a fractional part
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GameContext, Scope};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_truthiness() {
        let game = GameContext::default();
        let evaluator = Evaluator::new(Scope::new(&game));
        assert!(!evaluator.is_truthy(&Value::Text(String::new())));
        assert!(!evaluator.is_truthy(&Value::Number(0.0)));
        assert!(evaluator.is_truthy(&Value::List(Vec::new())));
        assert!(evaluator.is_truthy(&Value::Text("0".to_string())));
    }
}
