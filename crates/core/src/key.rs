use serde::{Deserialize, Serialize};

use crate::dataset::Row;

/// Separator between the parts of a composite key. Chosen because it is
/// not expected inside real key data.
pub const KEY_SEPARATOR: char = '|';

/// How field values become comparable keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Raw string form of the value.
    Exact,
    /// Trimmed, internal whitespace runs collapsed to one space,
    /// lowercased.
    Normalized,
}

impl Default for KeyMode {
    fn default() -> Self {
        Self::Exact
    }
}

/// Build a match key from one or more columns of a row.
///
/// Null and absent values stringify to empty text, so two rows that are
/// both null in every key column compare equal. Always returns text,
/// possibly empty.
pub fn build_key(row: &Row, columns: &[String], mode: KeyMode) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let raw = row.value(column).display_text();
        parts.push(match mode {
            KeyMode::Exact => raw,
            KeyMode::Normalized => normalize(&raw),
        });
    }
    parts.join(&KEY_SEPARATOR.to_string())
}

/// Normalize a single key part: trim, collapse whitespace, lowercase.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, Value)]) -> Row {
        Row {
            origin: 0,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn single_column_exact() {
        let r = row(&[("sku", Value::Text("AB 12".into()))]);
        assert_eq!(build_key(&r, &["sku".into()], KeyMode::Exact), "AB 12");
    }

    #[test]
    fn normalized_collapses_and_lowercases() {
        let r = row(&[("sku", Value::Text("  AB\t 12  ".into()))]);
        assert_eq!(
            build_key(&r, &["sku".into()], KeyMode::Normalized),
            "ab 12"
        );
    }

    #[test]
    fn composite_joins_with_separator() {
        let r = row(&[
            ("a", Value::Text("x".into())),
            ("b", Value::Number(7.0)),
        ]);
        assert_eq!(
            build_key(&r, &["a".into(), "b".into()], KeyMode::Exact),
            "x|7"
        );
    }

    #[test]
    fn null_and_missing_stringify_empty() {
        let r = row(&[("a", Value::Null)]);
        assert_eq!(
            build_key(&r, &["a".into(), "absent".into()], KeyMode::Exact),
            "|"
        );
        // Two all-null keys are equal by construction.
        let r2 = row(&[("absent", Value::Null)]);
        assert_eq!(
            build_key(&r, &["a".into()], KeyMode::Exact),
            build_key(&r2, &["a".into()], KeyMode::Exact),
        );
    }

    #[test]
    fn empty_row_map() {
        let r = Row {
            origin: 0,
            fields: HashMap::new(),
        };
        assert_eq!(build_key(&r, &["k".into()], KeyMode::Normalized), "");
    }
}
