use serde::Serialize;

use crate::aggregate::{AggregateConfig, AggregateOp, PredicateOp};
use crate::lookup::LookupConfig;
use crate::reconcile::ReconcileConfig;

/// Natural-language description of what an operation did, for the UI's
/// documentation panel. Purely descriptive; carries no behavior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub description: String,
    pub steps: Vec<String>,
    pub spreadsheet_equivalent: Option<String>,
    pub sql_equivalent: Option<String>,
}

pub fn reconcile(config: &ReconcileConfig) -> Explanation {
    let mut steps = vec![
        format!("Index both datasets by '{}'.", config.key_column),
        format!(
            "For keys on both sides, compare '{}' against '{}' (variance = counted - system).",
            config.system_qty_column, config.counted_qty_column
        ),
        "Classify keys: matched, variance, missing in target, missing in source.".to_string(),
    ];
    if let Some(cost) = &config.unit_cost_column {
        steps.push(format!(
            "Multiply each variance by '{cost}' for the dollar impact."
        ));
    }
    steps.push("Sort by impact magnitude, largest first.".to_string());

    Explanation {
        description: format!(
            "Full outer comparison of two datasets on '{}', with signed quantity variances.",
            config.key_column
        ),
        steps,
        spreadsheet_equivalent: Some(
            "VLOOKUP both directions, then subtract the quantity columns".to_string(),
        ),
        sql_equivalent: Some(format!(
            "SELECT ... FROM system FULL OUTER JOIN counts USING ({})",
            config.key_column
        )),
    }
}

pub fn aggregate(config: &AggregateConfig) -> Explanation {
    let predicate = &config.predicate;
    let op_text = match predicate.op {
        PredicateOp::Eq => "=",
        PredicateOp::Ne => "<>",
        PredicateOp::Gt => ">",
        PredicateOp::Lt => "<",
        PredicateOp::Gte => ">=",
        PredicateOp::Lte => "<=",
        PredicateOp::Contains => "contains",
        PredicateOp::StartsWith => "starts with",
        PredicateOp::EndsWith => "ends with",
    };
    let condition = format!(
        "{} {} {}",
        predicate.column,
        op_text,
        predicate.value.display_text()
    );

    let (function, verb) = match config.op {
        AggregateOp::Count => ("COUNTIF", "Count"),
        AggregateOp::Sum => ("SUMIF", "Sum"),
    };

    let mut steps = vec![format!("Keep rows where {condition}.")];
    match (config.op, &config.sum_column) {
        (AggregateOp::Sum, Some(column)) => {
            steps.push(format!("Sum '{column}' across the kept rows."))
        }
        _ => steps.push("Count the kept rows.".to_string()),
    }
    if let Some(group) = &config.group_by {
        steps.push(format!("Partition by '{group}' and aggregate each group."));
    }

    let sql_agg = match (config.op, &config.sum_column) {
        (AggregateOp::Sum, Some(column)) => format!("SUM({column})"),
        _ => "COUNT(*)".to_string(),
    };
    let sql = match &config.group_by {
        Some(group) => format!(
            "SELECT {group}, {sql_agg} FROM data WHERE {condition} GROUP BY {group}"
        ),
        None => format!("SELECT {sql_agg} FROM data WHERE {condition}"),
    };

    Explanation {
        description: format!("{verb} rows matching a condition."),
        steps,
        spreadsheet_equivalent: Some(format!("{function}(range, criteria, ...)")),
        sql_equivalent: Some(sql),
    }
}

pub fn duplicates(key_columns: &[String]) -> Explanation {
    let key = key_columns.join(" + ");
    Explanation {
        description: format!("Group rows by '{key}' and report keys occurring more than once."),
        steps: vec![
            format!("Build a key for every row from '{key}'."),
            "Group rows sharing a key; keep groups of two or more.".to_string(),
            "Sort groups by size, largest first.".to_string(),
        ],
        spreadsheet_equivalent: Some("COUNTIF(range, key) > 1".to_string()),
        sql_equivalent: Some(format!(
            "SELECT {key}, COUNT(*) FROM data GROUP BY {key} HAVING COUNT(*) > 1",
            key = key_columns.join(", ")
        )),
    }
}

pub fn lookup(config: &LookupConfig) -> Explanation {
    Explanation {
        description: format!(
            "Pull '{}' from the first source row whose '{}' matches each target row's '{}'.",
            config.return_column, config.source_key_column, config.target_key_column
        ),
        steps: vec![
            format!("Index source rows by '{}', first match wins.", config.source_key_column),
            format!(
                "For every target row, resolve '{}' through the index.",
                config.target_key_column
            ),
            "Report unmatched keys as 'not found' rather than blank.".to_string(),
        ],
        spreadsheet_equivalent: Some(format!(
            "VLOOKUP({}, source, {}, FALSE)",
            config.target_key_column, config.return_column
        )),
        sql_equivalent: Some(format!(
            "SELECT t.*, s.{} FROM target t LEFT JOIN source s ON t.{} = s.{}",
            config.return_column, config.target_key_column, config.source_key_column
        )),
    }
}

pub fn validation(rule_count: usize) -> Explanation {
    Explanation {
        description: format!("Check every row against {rule_count} column rule(s)."),
        steps: vec![
            "Run each rule's validator on its column for every row.".to_string(),
            "Record a finding per failure, with severity.".to_string(),
            "Count rows with at least one error-severity finding.".to_string(),
        ],
        spreadsheet_equivalent: Some("Data validation / conditional formatting".to_string()),
        sql_equivalent: None,
    }
}
