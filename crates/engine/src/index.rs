use rustc_hash::FxHashMap;

use rowsight_core::{build_key, Dataset, KeyMode};

use crate::error::EngineError;

/// Hash index over a dataset's match key.
///
/// Every origin that shares a key is kept, in row order. Two accessors
/// expose two deliberately divergent behaviors over the same grouping:
/// `first` drops non-first duplicates (single-value join semantics, the
/// spreadsheet VLOOKUP rule) while `origins` preserves all occurrences
/// (duplicate detection). Do not merge them.
///
/// Keys are also kept in first-seen order; output ordering never comes
/// from hash-map iteration.
#[derive(Debug, Clone)]
pub struct KeyIndex {
    dataset_name: String,
    keys: Vec<String>,
    groups: FxHashMap<String, Vec<usize>>,
}

impl KeyIndex {
    /// Build an index over one or two key columns.
    ///
    /// A key column absent from the dataset's schema is a configuration
    /// error, surfaced immediately rather than matching nothing.
    pub fn build(
        dataset: &Dataset,
        key_columns: &[String],
        mode: KeyMode,
    ) -> Result<Self, EngineError> {
        for column in key_columns {
            if !dataset.has_column(column) {
                return Err(EngineError::KeyColumnNotFound {
                    dataset: dataset.name.clone(),
                    column: column.clone(),
                });
            }
        }

        let mut keys: Vec<String> = Vec::new();
        let mut groups: FxHashMap<String, Vec<usize>> = FxHashMap::default();

        for row in &dataset.rows {
            let key = build_key(row, key_columns, mode);
            let group = groups.entry(key.clone()).or_insert_with(|| {
                keys.push(key);
                Vec::new()
            });
            group.push(row.origin);
        }

        Ok(Self {
            dataset_name: dataset.name.clone(),
            keys,
            groups,
        })
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    /// All origins sharing `key`, in row order.
    pub fn origins(&self, key: &str) -> Option<&[usize]> {
        self.groups.get(key).map(|v| v.as_slice())
    }

    /// First origin for `key` — first match wins, later occurrences are
    /// silently dropped for single-value joins.
    pub fn first(&self, key: &str) -> Option<usize> {
        self.groups.get(key).and_then(|v| v.first().copied())
    }
}

/// Full-outer-join classification of two indexes, by key.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput {
    /// Keys present in both sides, in A's first-seen order.
    pub in_both: Vec<String>,
    /// Keys only in A, in A's first-seen order.
    pub only_in_a: Vec<String>,
    /// Keys only in B, in B's first-seen order.
    pub only_in_b: Vec<String>,
}

/// Classify every key of A then every key of B absent from A. The
/// two-pass order makes the output deterministic and A-first regardless
/// of hash-table internals.
pub fn full_outer_match(a: &KeyIndex, b: &KeyIndex) -> JoinOutput {
    let mut in_both = Vec::new();
    let mut only_in_a = Vec::new();
    let mut only_in_b = Vec::new();

    for key in a.keys() {
        if b.contains(key) {
            in_both.push(key.clone());
        } else {
            only_in_a.push(key.clone());
        }
    }

    for key in b.keys() {
        if !a.contains(key) {
            only_in_b.push(key.clone());
        }
    }

    JoinOutput {
        in_both,
        only_in_a,
        only_in_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowsight_core::Value;
    use std::collections::HashMap;

    fn dataset(name: &str, skus: &[&str]) -> Dataset {
        Dataset::from_rows(
            name,
            vec!["sku".into()],
            skus.iter().map(|s| {
                let mut fields = HashMap::new();
                fields.insert("sku".to_string(), Value::from_input(s));
                fields
            }),
        )
    }

    #[test]
    fn build_preserves_first_seen_order() {
        let ds = dataset("a", &["x", "y", "x", "z"]);
        let index = KeyIndex::build(&ds, &["sku".into()], KeyMode::Exact).unwrap();
        assert_eq!(index.keys(), &["x", "y", "z"]);
        assert_eq!(index.origins("x"), Some(&[0usize, 2][..]));
        assert_eq!(index.first("x"), Some(0));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn missing_key_column_is_config_error() {
        let ds = dataset("counts", &["x"]);
        let err = KeyIndex::build(&ds, &["nope".into()], KeyMode::Exact).unwrap_err();
        assert_eq!(
            err,
            EngineError::KeyColumnNotFound {
                dataset: "counts".into(),
                column: "nope".into(),
            }
        );
    }

    #[test]
    fn full_outer_classification() {
        let a = KeyIndex::build(&dataset("a", &["x", "y"]), &["sku".into()], KeyMode::Exact)
            .unwrap();
        let b = KeyIndex::build(&dataset("b", &["y", "z"]), &["sku".into()], KeyMode::Exact)
            .unwrap();
        let join = full_outer_match(&a, &b);
        assert_eq!(join.in_both, vec!["y"]);
        assert_eq!(join.only_in_a, vec!["x"]);
        assert_eq!(join.only_in_b, vec!["z"]);
    }

    #[test]
    fn join_completeness_by_key() {
        let a = KeyIndex::build(
            &dataset("a", &["k1", "k2", "k3", "k1"]),
            &["sku".into()],
            KeyMode::Exact,
        )
        .unwrap();
        let b = KeyIndex::build(
            &dataset("b", &["k3", "k4"]),
            &["sku".into()],
            KeyMode::Exact,
        )
        .unwrap();
        let join = full_outer_match(&a, &b);
        assert_eq!(join.only_in_a.len() + join.in_both.len(), a.len());
        assert_eq!(join.only_in_b.len() + join.in_both.len(), b.len());
    }

    #[test]
    fn normalized_mode_merges_keys() {
        let ds = dataset("a", &["AB", "ab "]);
        let exact = KeyIndex::build(&ds, &["sku".into()], KeyMode::Exact).unwrap();
        let norm = KeyIndex::build(&ds, &["sku".into()], KeyMode::Normalized).unwrap();
        assert_eq!(exact.len(), 2);
        assert_eq!(norm.len(), 1);
        assert_eq!(norm.origins("ab"), Some(&[0usize, 1][..]));
    }

    #[test]
    fn null_keys_group_together() {
        let mut ds = Dataset::new("a", vec!["sku".into()]);
        ds.push_row(HashMap::new());
        ds.push_row(HashMap::new());
        let index = KeyIndex::build(&ds, &["sku".into()], KeyMode::Exact).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.origins(""), Some(&[0usize, 1][..]));
    }
}
