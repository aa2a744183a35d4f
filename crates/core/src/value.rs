use serde::{Deserialize, Serialize};

/// A single field value. Absence (`Null`) and empty text are distinct
/// from numeric zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Coerce raw importer text into a typed value. Numeric-looking text
    /// becomes `Number`, empty text becomes `Null`.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Value::Null;
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            return Value::Number(num);
        }

        Value::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string form. `Null` stringifies to empty text, which is
    /// what key construction relies on.
    pub fn display_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
        }
    }

    /// Lenient numeric read: null, empty and malformed text all coerce
    /// to 0. Never NaN. Reconciliation quantities use this policy, so a
    /// row with a garbage quantity reconciles as zero instead of failing
    /// the whole run.
    pub fn lenient_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => {
                if n.is_nan() {
                    0.0
                } else {
                    *n
                }
            }
            Value::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Strict numeric read: `None` for null, booleans and non-numeric
    /// text. Aggregator numeric predicates use this policy: a row whose
    /// field cannot be read as a number fails the predicate rather than
    /// comparing as zero. Deliberately different from `lenient_number`.
    pub fn strict_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => {
                if n.is_nan() {
                    None
                } else {
                    Some(*n)
                }
            }
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::Bool(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_input_types() {
        assert_eq!(Value::from_input(""), Value::Null);
        assert_eq!(Value::from_input("   "), Value::Null);
        assert_eq!(Value::from_input("42"), Value::Number(42.0));
        assert_eq!(Value::from_input("-3.5"), Value::Number(-3.5));
        assert_eq!(Value::from_input("abc"), Value::Text("abc".into()));
    }

    #[test]
    fn display_text_forms() {
        assert_eq!(Value::Null.display_text(), "");
        assert_eq!(Value::Number(10.0).display_text(), "10");
        assert_eq!(Value::Number(2.5).display_text(), "2.5");
        assert_eq!(Value::Bool(true).display_text(), "true");
        assert_eq!(Value::Text("x".into()).display_text(), "x");
    }

    #[test]
    fn lenient_zero_policy() {
        assert_eq!(Value::Null.lenient_number(), 0.0);
        assert_eq!(Value::Text("".into()).lenient_number(), 0.0);
        assert_eq!(Value::Text("n/a".into()).lenient_number(), 0.0);
        assert_eq!(Value::Text(" 7 ".into()).lenient_number(), 7.0);
        assert_eq!(Value::Number(f64::NAN).lenient_number(), 0.0);
    }

    #[test]
    fn strict_policy_rejects_non_numeric() {
        assert_eq!(Value::Null.strict_number(), None);
        assert_eq!(Value::Bool(true).strict_number(), None);
        assert_eq!(Value::Text("n/a".into()).strict_number(), None);
        assert_eq!(Value::Text("8".into()).strict_number(), Some(8.0));
        assert_eq!(Value::Number(1.5).strict_number(), Some(1.5));
    }
}
