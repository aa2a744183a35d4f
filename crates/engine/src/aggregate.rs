use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use rowsight_core::{Dataset, Value};

use crate::error::EngineError;

/// Group label used when the group-by field is null or empty.
pub const EMPTY_GROUP_LABEL: &str = "(empty)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
}

impl PredicateOp {
    fn is_numeric(self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Gte | Self::Lte)
    }
}

/// A single-column row filter: `column <op> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub op: PredicateOp,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: PredicateOp, value: Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    /// Whether a field value satisfies the predicate.
    ///
    /// Null fields never match. Numeric operators coerce both sides
    /// strictly: a non-numeric field or literal fails the predicate
    /// outright, unlike reconciliation's lenient-zero quantity policy.
    /// String operators compare case-insensitively.
    pub fn matches(&self, field: &Value) -> bool {
        if field.is_null() {
            return false;
        }

        if self.op.is_numeric() {
            let (Some(lhs), Some(rhs)) = (field.strict_number(), self.value.strict_number())
            else {
                return false;
            };
            return match self.op {
                PredicateOp::Gt => lhs > rhs,
                PredicateOp::Lt => lhs < rhs,
                PredicateOp::Gte => lhs >= rhs,
                PredicateOp::Lte => lhs <= rhs,
                _ => unreachable!(),
            };
        }

        let lhs = field.display_text().to_lowercase();
        let rhs = self.value.display_text().to_lowercase();
        match self.op {
            PredicateOp::Eq => lhs == rhs,
            PredicateOp::Ne => lhs != rhs,
            PredicateOp::Contains => lhs.contains(&rhs),
            PredicateOp::StartsWith => lhs.starts_with(&rhs),
            PredicateOp::EndsWith => lhs.ends_with(&rhs),
            _ => unreachable!(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    Count,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub predicate: Predicate,
    pub op: AggregateOp,
    /// Column summed when `op` is Sum. Required for Sum.
    #[serde(default)]
    pub sum_column: Option<String>,
    /// Partition matching rows by this column's display text.
    #[serde(default)]
    pub group_by: Option<String>,
}

impl AggregateConfig {
    pub fn count(predicate: Predicate) -> Self {
        Self {
            predicate,
            op: AggregateOp::Count,
            sum_column: None,
            group_by: None,
        }
    }

    pub fn sum(predicate: Predicate, sum_column: impl Into<String>) -> Self {
        Self {
            predicate,
            op: AggregateOp::Sum,
            sum_column: Some(sum_column.into()),
            group_by: None,
        }
    }

    pub fn grouped_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    pub fn validate(&self, dataset: &Dataset) -> Result<(), EngineError> {
        if !dataset.has_column(&self.predicate.column) {
            return Err(EngineError::ColumnNotFound {
                dataset: dataset.name.clone(),
                column: self.predicate.column.clone(),
            });
        }
        match (self.op, &self.sum_column) {
            (AggregateOp::Sum, None) => {
                return Err(EngineError::ConfigValidation(
                    "sum requires a sum column".into(),
                ));
            }
            (AggregateOp::Sum, Some(column)) if !dataset.has_column(column) => {
                return Err(EngineError::ColumnNotFound {
                    dataset: dataset.name.clone(),
                    column: column.clone(),
                });
            }
            _ => {}
        }
        if let Some(column) = &self.group_by {
            if !dataset.has_column(column) {
                return Err(EngineError::ColumnNotFound {
                    dataset: dataset.name.clone(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub label: String,
    pub value: f64,
    pub matched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub total: usize,
    pub matched: usize,
    /// Scalar count or sum across all matching rows.
    pub value: f64,
    /// One aggregate per group when group-by is configured, sorted
    /// descending by value, ties ascending label.
    pub groups: Option<Vec<GroupAggregate>>,
}

/// SUMIF/COUNTIF over one dataset.
///
/// Matching rows' sum fields read leniently (malformed → 0, matching the
/// reconciliation quantity policy); the predicate itself is strict.
pub fn run(dataset: &Dataset, config: &AggregateConfig) -> Result<AggregateResult, EngineError> {
    config.validate(dataset)?;

    let mut matched = 0usize;
    let mut value = 0.0f64;
    // Group partitions in first-seen order; sorted at the end.
    let mut labels: Vec<String> = Vec::new();
    let mut groups: Vec<GroupAggregate> = Vec::new();

    for row in &dataset.rows {
        if !config.predicate.matches(row.value(&config.predicate.column)) {
            continue;
        }
        matched += 1;

        let contribution = match config.op {
            AggregateOp::Count => 1.0,
            AggregateOp::Sum => {
                let column = config.sum_column.as_deref().unwrap_or_default();
                row.value(column).lenient_number()
            }
        };
        value += contribution;

        if let Some(group_column) = &config.group_by {
            let text = row.value(group_column).display_text();
            let label = if text.is_empty() {
                EMPTY_GROUP_LABEL.to_string()
            } else {
                text
            };
            let idx = match labels.iter().position(|l| *l == label) {
                Some(idx) => idx,
                None => {
                    labels.push(label.clone());
                    groups.push(GroupAggregate {
                        label,
                        value: 0.0,
                        matched: 0,
                    });
                    groups.len() - 1
                }
            };
            groups[idx].value += contribution;
            groups[idx].matched += 1;
        }
    }

    let groups = config.group_by.as_ref().map(|_| {
        groups.sort_by_key(|g| (Reverse(OrderedFloat(g.value)), g.label.clone()));
        groups
    });

    Ok(AggregateResult {
        total: dataset.len(),
        matched,
        value,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn dataset(rows: &[&[(&str, &str)]]) -> Dataset {
        let columns = vec!["region".into(), "qty".into(), "status".into()];
        Dataset::from_rows(
            "orders",
            columns,
            rows.iter().map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::from_input(v)))
                    .collect::<HashMap<_, _>>()
            }),
        )
    }

    fn sample() -> Dataset {
        dataset(&[
            &[("region", "East"), ("qty", "10"), ("status", "open")],
            &[("region", "east"), ("qty", "5"), ("status", "closed")],
            &[("region", "West"), ("qty", "7"), ("status", "open")],
            &[("region", ""), ("qty", "2"), ("status", "open")],
        ])
    }

    #[test]
    fn countif_case_insensitive_eq() {
        let config = AggregateConfig::count(Predicate::new(
            "region",
            PredicateOp::Eq,
            Value::Text("EAST".into()),
        ));
        let result = run(&sample(), &config).unwrap();
        assert_eq!(result.matched, 2);
        assert_eq!(result.value, 2.0);
        assert_eq!(result.total, 4);
        assert!(result.groups.is_none());
    }

    #[test]
    fn sumif_numeric_predicate_strict() {
        let ds = dataset(&[
            &[("region", "E"), ("qty", "10"), ("status", "open")],
            &[("region", "E"), ("qty", "oops"), ("status", "open")],
            &[("region", "E"), ("qty", "3"), ("status", "open")],
        ]);
        // qty > 4: the malformed row fails the predicate (strict), it is
        // not treated as zero.
        let config = AggregateConfig::sum(
            Predicate::new("qty", PredicateOp::Gt, Value::Number(4.0)),
            "qty",
        );
        let result = run(&ds, &config).unwrap();
        assert_eq!(result.matched, 1);
        assert_eq!(result.value, 10.0);
    }

    #[test]
    fn null_fields_never_match() {
        let ds = dataset(&[&[("qty", "1"), ("status", "open")]]); // region absent
        let config = AggregateConfig::count(Predicate::new(
            "region",
            PredicateOp::Ne,
            Value::Text("East".into()),
        ));
        let result = run(&ds, &config).unwrap();
        assert_eq!(result.matched, 0);
    }

    #[test]
    fn string_operators() {
        let ds = sample();
        for (op, value, expected) in [
            (PredicateOp::Contains, "as", 2usize),
            (PredicateOp::StartsWith, "we", 1),
            (PredicateOp::EndsWith, "st", 3),
        ] {
            let config = AggregateConfig::count(Predicate::new(
                "region",
                op,
                Value::Text(value.into()),
            ));
            let result = run(&ds, &config).unwrap();
            assert_eq!(result.matched, expected, "op {op:?}");
        }
    }

    #[test]
    fn grouped_sum_with_empty_sentinel() {
        let config = AggregateConfig::sum(
            Predicate::new("status", PredicateOp::Eq, Value::Text("open".into())),
            "qty",
        )
        .grouped_by("region");
        let result = run(&sample(), &config).unwrap();
        let groups = result.groups.unwrap();
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        // East 10, West 7, (empty) 2 — descending by value.
        assert_eq!(labels, vec!["East", "West", EMPTY_GROUP_LABEL]);
        assert_eq!(groups[0].value, 10.0);
        assert_eq!(groups[2].value, 2.0);
        assert_eq!(result.value, 19.0);
    }

    #[test]
    fn sum_without_sum_column_is_config_error() {
        let config = AggregateConfig {
            predicate: Predicate::new("status", PredicateOp::Eq, Value::Text("open".into())),
            op: AggregateOp::Sum,
            sum_column: None,
            group_by: None,
        };
        let err = run(&sample(), &config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigValidation(_)));
    }

    #[test]
    fn missing_predicate_column_is_config_error() {
        let config = AggregateConfig::count(Predicate::new(
            "nope",
            PredicateOp::Eq,
            Value::Text("x".into()),
        ));
        let err = run(&sample(), &config).unwrap_err();
        assert_eq!(
            err,
            EngineError::ColumnNotFound {
                dataset: "orders".into(),
                column: "nope".into(),
            }
        );
    }
}
