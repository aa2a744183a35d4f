use serde::{Deserialize, Serialize};

use rowsight_core::{Dataset, Value};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Key column in the dataset receiving values.
    pub target_key_column: String,
    /// Key column in the dataset being searched.
    pub source_key_column: String,
    /// Column whose value is returned from the first matching source row.
    pub return_column: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Resolution outcome for one target row. `NotFound` is an explicit
/// sentinel: a resolved-but-empty source field comes back as
/// `Found(Null)`, which is a different answer than no match at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found(Value),
    NotFound,
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRow {
    /// Origin index of the target row.
    pub origin: usize,
    pub key: String,
    pub outcome: LookupOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub rows: Vec<LookupRow>,
    pub stats: LookupStats,
}

/// VLOOKUP-style first-match resolution from source into target.
///
/// The source index keeps only the first row per key; later duplicates
/// are silently dropped, consistent with spreadsheet lookup behavior.
pub fn run(
    target: &Dataset,
    source: &Dataset,
    config: &LookupConfig,
) -> Result<LookupResult, EngineError> {
    for (dataset, column) in [
        (target, &config.target_key_column),
        (source, &config.source_key_column),
        (source, &config.return_column),
    ] {
        if !dataset.has_column(column) {
            return Err(EngineError::ColumnNotFound {
                dataset: dataset.name.clone(),
                column: column.clone(),
            });
        }
    }

    let fold = |raw: String| {
        if config.case_insensitive {
            raw.to_lowercase()
        } else {
            raw
        }
    };

    // First-match index over the source key.
    let mut index: rustc_hash::FxHashMap<String, usize> = rustc_hash::FxHashMap::default();
    for row in &source.rows {
        let key = fold(row.value(&config.source_key_column).display_text());
        index.entry(key).or_insert(row.origin);
    }

    let mut rows = Vec::with_capacity(target.len());
    let mut resolved = 0;
    for row in &target.rows {
        let key = fold(row.value(&config.target_key_column).display_text());
        let outcome = match index.get(&key) {
            Some(&origin) => {
                resolved += 1;
                LookupOutcome::Found(source.value(origin, &config.return_column).clone())
            }
            None => LookupOutcome::NotFound,
        };
        rows.push(LookupRow {
            origin: row.origin,
            key,
            outcome,
        });
    }

    let stats = LookupStats {
        total: target.len(),
        resolved,
        unresolved: target.len() - resolved,
    };

    Ok(LookupResult { rows, stats })
}
