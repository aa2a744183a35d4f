use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use rowsight_core::{Dataset, KeyMode};

use crate::error::EngineError;
use crate::index::{full_outer_match, KeyIndex};

/// Classification of one key across the system/count full outer join.
/// Mutually exclusive; every key present on either side lands in exactly
/// one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchClass {
    Matched,
    Variance,
    /// Present in the system dataset, absent from the count.
    MissingInTarget,
    /// Present in the count dataset, absent from the system.
    MissingInSource,
}

impl std::fmt::Display for MatchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Variance => write!(f, "variance"),
            Self::MissingInTarget => write!(f, "missing_in_target"),
            Self::MissingInSource => write!(f, "missing_in_source"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub key_column: String,
    /// Quantity column read from the system dataset.
    pub system_qty_column: String,
    /// Quantity column read from the count dataset.
    pub counted_qty_column: String,
    /// Unit cost column (system dataset). Absent means no monetary data.
    #[serde(default)]
    pub unit_cost_column: Option<String>,
    #[serde(default)]
    pub include_matches: bool,
    #[serde(default)]
    pub key_mode: KeyMode,
}

impl ReconcileConfig {
    pub fn new(
        key_column: impl Into<String>,
        system_qty_column: impl Into<String>,
        counted_qty_column: impl Into<String>,
    ) -> Self {
        Self {
            key_column: key_column.into(),
            system_qty_column: system_qty_column.into(),
            counted_qty_column: counted_qty_column.into(),
            unit_cost_column: None,
            include_matches: false,
            key_mode: KeyMode::Exact,
        }
    }

    pub fn with_unit_cost(mut self, column: impl Into<String>) -> Self {
        self.unit_cost_column = Some(column.into());
        self
    }

    pub fn with_matches(mut self) -> Self {
        self.include_matches = true;
        self
    }

    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.key_column.is_empty() {
            return Err(EngineError::ConfigValidation(
                "key column must be selected".into(),
            ));
        }
        if self.system_qty_column.is_empty() || self.counted_qty_column.is_empty() {
            return Err(EngineError::ConfigValidation(
                "both quantity columns must be selected".into(),
            ));
        }
        Ok(())
    }
}

/// One classified result row. Origin indices trace back to the source
/// rows on each side; a missing side has no origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileRow {
    pub key: String,
    pub class: MatchClass,
    pub system_qty: f64,
    pub counted_qty: f64,
    /// Signed: counted − system.
    pub variance: f64,
    /// variance × unit cost. `None` means "no monetary data", which is
    /// not the same as zero impact.
    pub dollar_impact: Option<f64>,
    pub origin_system: Option<usize>,
    pub origin_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileSummary {
    pub matched: usize,
    pub variances: usize,
    pub missing_in_target: usize,
    pub missing_in_source: usize,
    pub system_rows: usize,
    pub count_rows: usize,
    pub system_keys: usize,
    pub count_keys: usize,
    /// Sum of |variance| across all classified keys.
    pub total_abs_variance: f64,
    /// Signed dollar total across Variance rows only; missing rows do
    /// not contribute here.
    pub variance_dollar_total: Option<f64>,
    /// Signed dollar total across every row that has monetary data,
    /// Missing rows included. Kept separate from the Variance-only
    /// total; the two must stay distinct and labeled.
    pub full_dollar_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileMeta {
    pub system_dataset: String,
    pub count_dataset: String,
    pub key_column: String,
    pub engine_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileResult {
    pub meta: ReconcileMeta,
    pub summary: ReconcileSummary,
    pub rows: Vec<ReconcileRow>,
}

/// Reconcile a system dataset against a physical-count dataset on a
/// shared key, comparing one quantity column from each side.
///
/// Quantities parse leniently: null, empty and malformed values count as
/// zero rather than failing the run. This is a documented simplification
/// (the aggregator's numeric predicates use the opposite, strict policy).
///
/// When a key occurs more than once on a side, the first occurrence wins;
/// duplicate detection is a separate operation that preserves all of them.
pub fn run(
    system: &Dataset,
    counts: &Dataset,
    config: &ReconcileConfig,
) -> Result<ReconcileResult, EngineError> {
    config.validate()?;

    for (dataset, column) in [
        (system, &config.system_qty_column),
        (counts, &config.counted_qty_column),
    ] {
        if !dataset.has_column(column) {
            return Err(EngineError::ColumnNotFound {
                dataset: dataset.name.clone(),
                column: column.clone(),
            });
        }
    }
    if let Some(cost_column) = &config.unit_cost_column {
        if !system.has_column(cost_column) {
            return Err(EngineError::ColumnNotFound {
                dataset: system.name.clone(),
                column: cost_column.clone(),
            });
        }
    }

    let key_columns = [config.key_column.clone()];
    let system_index = KeyIndex::build(system, &key_columns, config.key_mode)?;
    let count_index = KeyIndex::build(counts, &key_columns, config.key_mode)?;
    let join = full_outer_match(&system_index, &count_index);

    let has_cost = config.unit_cost_column.is_some();
    let mut rows: Vec<ReconcileRow> = Vec::new();

    for key in &join.in_both {
        // First match wins on both sides.
        let origin_a = system_index.first(key).unwrap_or(0);
        let origin_b = count_index.first(key).unwrap_or(0);

        let system_qty = system
            .value(origin_a, &config.system_qty_column)
            .lenient_number();
        let counted_qty = counts
            .value(origin_b, &config.counted_qty_column)
            .lenient_number();
        let variance = counted_qty - system_qty;

        let class = if variance == 0.0 {
            MatchClass::Matched
        } else {
            MatchClass::Variance
        };
        let dollar_impact = unit_cost(system, origin_a, config).map(|cost| variance * cost);
        rows.push(ReconcileRow {
            key: key.clone(),
            class,
            system_qty,
            counted_qty,
            variance,
            dollar_impact,
            origin_system: Some(origin_a),
            origin_count: Some(origin_b),
        });
    }

    for key in &join.only_in_a {
        let origin_a = system_index.first(key).unwrap_or(0);
        let system_qty = system
            .value(origin_a, &config.system_qty_column)
            .lenient_number();
        let variance = -system_qty;
        let dollar_impact = unit_cost(system, origin_a, config).map(|cost| variance * cost);
        rows.push(ReconcileRow {
            key: key.clone(),
            class: MatchClass::MissingInTarget,
            system_qty,
            counted_qty: 0.0,
            variance,
            dollar_impact,
            origin_system: Some(origin_a),
            origin_count: None,
        });
    }

    for key in &join.only_in_b {
        let origin_b = count_index.first(key).unwrap_or(0);
        let counted_qty = counts
            .value(origin_b, &config.counted_qty_column)
            .lenient_number();
        // Unit cost lives on the system side; there is no system row here.
        rows.push(ReconcileRow {
            key: key.clone(),
            class: MatchClass::MissingInSource,
            system_qty: 0.0,
            counted_qty,
            variance: counted_qty,
            dollar_impact: None,
            origin_system: None,
            origin_count: Some(origin_b),
        });
    }

    let summary = summarize(&rows, system, counts, &system_index, &count_index, has_cost);

    if !config.include_matches {
        rows.retain(|r| r.class != MatchClass::Matched);
    }
    sort_rows(&mut rows);

    Ok(ReconcileResult {
        meta: ReconcileMeta {
            system_dataset: system.name.clone(),
            count_dataset: counts.name.clone(),
            key_column: config.key_column.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        summary,
        rows,
    })
}

fn unit_cost(system: &Dataset, origin: usize, config: &ReconcileConfig) -> Option<f64> {
    config
        .unit_cost_column
        .as_ref()
        .map(|column| system.value(origin, column).lenient_number())
}

/// Descending |dollar impact| where monetary data exists, else descending
/// |variance|; ties broken by ascending key text for determinism.
fn sort_rows(rows: &mut [ReconcileRow]) {
    rows.sort_by_key(|r| {
        let magnitude = r.dollar_impact.map(f64::abs).unwrap_or(r.variance.abs());
        (Reverse(OrderedFloat(magnitude)), r.key.clone())
    });
}

fn summarize(
    rows: &[ReconcileRow],
    system: &Dataset,
    counts: &Dataset,
    system_index: &KeyIndex,
    count_index: &KeyIndex,
    has_cost: bool,
) -> ReconcileSummary {
    let mut matched = 0;
    let mut variances = 0;
    let mut missing_in_target = 0;
    let mut missing_in_source = 0;
    let mut total_abs_variance = 0.0;
    let mut variance_dollar_total = 0.0;
    let mut full_dollar_total = 0.0;

    for row in rows {
        match row.class {
            MatchClass::Matched => matched += 1,
            MatchClass::Variance => variances += 1,
            MatchClass::MissingInTarget => missing_in_target += 1,
            MatchClass::MissingInSource => missing_in_source += 1,
        }
        total_abs_variance += row.variance.abs();
        if let Some(impact) = row.dollar_impact {
            full_dollar_total += impact;
            if row.class == MatchClass::Variance {
                variance_dollar_total += impact;
            }
        }
    }

    ReconcileSummary {
        matched,
        variances,
        missing_in_target,
        missing_in_source,
        system_rows: system.len(),
        count_rows: counts.len(),
        system_keys: system_index.len(),
        count_keys: count_index.len(),
        total_abs_variance,
        variance_dollar_total: has_cost.then_some(variance_dollar_total),
        full_dollar_total: has_cost.then_some(full_dollar_total),
    }
}
