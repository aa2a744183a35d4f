use std::cmp::Reverse;

use serde::Serialize;

use rowsight_core::{Dataset, KeyMode};

use crate::error::EngineError;
use crate::index::KeyIndex;

/// Rows sharing one key. Only groups with at least two members are
/// reported; origins are in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub origins: Vec<usize>,
}

impl DuplicateGroup {
    pub fn size(&self) -> usize {
        self.origins.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateStats {
    pub total_rows: usize,
    pub unique_keys: usize,
    pub duplicate_keys: usize,
    /// All members of duplicate groups, not just the extras.
    pub duplicate_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub stats: DuplicateStats,
}

/// Group rows by composite key and report keys occurring more than once.
///
/// Unlike the single-value joins, every occurrence is preserved here —
/// the whole point is to see them all. Groups sort descending by size,
/// ties in first-seen key order.
pub fn find_duplicates(
    dataset: &Dataset,
    key_columns: &[String],
    mode: KeyMode,
) -> Result<DuplicateReport, EngineError> {
    let index = KeyIndex::build(dataset, key_columns, mode)?;

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for key in index.keys() {
        let origins = index.origins(key).unwrap_or(&[]);
        if origins.len() >= 2 {
            groups.push(DuplicateGroup {
                key: key.clone(),
                origins: origins.to_vec(),
            });
        }
    }

    // Stable sort keeps first-seen key order within equal sizes.
    groups.sort_by_key(|g| Reverse(g.size()));

    let duplicate_rows = groups.iter().map(DuplicateGroup::size).sum();
    let stats = DuplicateStats {
        total_rows: dataset.len(),
        unique_keys: index.len(),
        duplicate_keys: groups.len(),
        duplicate_rows,
    };

    Ok(DuplicateReport { groups, stats })
}
