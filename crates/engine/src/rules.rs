use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use rowsight_core::{Dataset, Value};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Closed set of rule types, one validator per variant. Unknown tags from
/// stored configurations survive as `Unknown` so evaluation can report
/// them instead of failing a missing-key lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    Numeric,
    Integer,
    Positive,
    Min(f64),
    Max(f64),
    /// Exact character count.
    Length(usize),
    MinLength(usize),
    /// Regular expression the stringified value must match.
    Pattern(String),
    /// Comma-separated allow-list; exact string match.
    OneOf(Vec<String>),
    Unknown(String),
}

impl RuleKind {
    /// Compile a stored (tag, threshold) pair. Unrecognized tags become
    /// `Unknown` rather than an error; evaluation reports and skips them.
    pub fn parse(tag: &str, threshold: Option<&str>) -> Self {
        let threshold_num = threshold.and_then(|t| t.trim().parse::<f64>().ok());
        match tag {
            "required" => Self::Required,
            "numeric" => Self::Numeric,
            "integer" => Self::Integer,
            "positive" => Self::Positive,
            "min" => match threshold_num {
                Some(n) => Self::Min(n),
                None => Self::Unknown(format!("{tag} (missing threshold)")),
            },
            "max" => match threshold_num {
                Some(n) => Self::Max(n),
                None => Self::Unknown(format!("{tag} (missing threshold)")),
            },
            "length" => match threshold_num {
                Some(n) if n >= 0.0 => Self::Length(n as usize),
                _ => Self::Unknown(format!("{tag} (missing threshold)")),
            },
            "min_length" | "minLength" => match threshold_num {
                Some(n) if n >= 0.0 => Self::MinLength(n as usize),
                _ => Self::Unknown(format!("{tag} (missing threshold)")),
            },
            "pattern" => match threshold {
                Some(p) => Self::Pattern(p.to_string()),
                None => Self::Unknown(format!("{tag} (missing pattern)")),
            },
            "one_of" | "oneOf" => match threshold {
                Some(list) => Self::OneOf(
                    list.split(',').map(|s| s.trim().to_string()).collect(),
                ),
                None => Self::Unknown(format!("{tag} (missing allow-list)")),
            },
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Short label used in findings.
    pub fn label(&self) -> String {
        match self {
            Self::Required => "required".into(),
            Self::Numeric => "numeric".into(),
            Self::Integer => "integer".into(),
            Self::Positive => "positive".into(),
            Self::Min(_) => "min".into(),
            Self::Max(_) => "max".into(),
            Self::Length(_) => "length".into(),
            Self::MinLength(_) => "min_length".into(),
            Self::Pattern(_) => "pattern".into(),
            Self::OneOf(_) => "one_of".into(),
            Self::Unknown(tag) => format!("unknown:{tag}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub column: String,
    pub kind: RuleKind,
    pub severity: Severity,
}

impl Rule {
    pub fn new(column: impl Into<String>, kind: RuleKind, severity: Severity) -> Self {
        Self {
            column: column.into(),
            kind,
            severity,
        }
    }
}

/// One rule failure on one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Origin index of the failing row.
    pub row: usize,
    pub column: String,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

/// A rule that could not be evaluated (unknown tag, invalid pattern).
/// Reported, never fatal: the other rules still run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRule {
    pub column: String,
    pub rule: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationStats {
    pub total_rows: usize,
    /// Rows with at least one error-severity finding. Warnings alone do
    /// not put a row in this count.
    pub rows_with_errors: usize,
    pub total_findings: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    pub skipped_rules: Vec<SkippedRule>,
    pub stats: ValidationStats,
}

enum Validator {
    Kind(RuleKind),
    Compiled(Regex),
}

/// Evaluate an ordered rule list against every row.
///
/// Blank values (null or empty text) only fail `required`; the other
/// rules treat blanks as out of scope so one empty cell doesn't fail
/// half the rule list at once.
pub fn validate(dataset: &Dataset, rules: &[Rule]) -> Result<ValidationReport, EngineError> {
    // A rule naming a column the dataset doesn't have is a configuration
    // error; unknown tags are rule-level faults and only skip themselves.
    for rule in rules {
        if matches!(rule.kind, RuleKind::Unknown(_)) {
            continue;
        }
        if !dataset.has_column(&rule.column) {
            return Err(EngineError::ColumnNotFound {
                dataset: dataset.name.clone(),
                column: rule.column.clone(),
            });
        }
    }

    let mut skipped_rules = Vec::new();
    let mut active: Vec<(&Rule, Validator)> = Vec::new();
    for rule in rules {
        match &rule.kind {
            RuleKind::Unknown(tag) => skipped_rules.push(SkippedRule {
                column: rule.column.clone(),
                rule: rule.kind.label(),
                reason: format!("unknown rule type '{tag}'"),
            }),
            RuleKind::Pattern(pattern) => match Regex::new(pattern) {
                Ok(regex) => active.push((rule, Validator::Compiled(regex))),
                Err(err) => skipped_rules.push(SkippedRule {
                    column: rule.column.clone(),
                    rule: rule.kind.label(),
                    reason: format!("invalid pattern '{pattern}': {err}"),
                }),
            },
            kind => active.push((rule, Validator::Kind(kind.clone()))),
        }
    }

    let mut findings = Vec::new();
    let mut error_rows: HashSet<usize> = HashSet::new();
    let mut errors = 0;
    let mut warnings = 0;

    for row in &dataset.rows {
        for (rule, validator) in &active {
            let value = row.value(&rule.column);
            let failure = match validator {
                Validator::Compiled(regex) => check_pattern(value, regex),
                Validator::Kind(kind) => check(kind, value),
            };
            if let Some(message) = failure {
                match rule.severity {
                    Severity::Error => {
                        errors += 1;
                        error_rows.insert(row.origin);
                    }
                    Severity::Warning => warnings += 1,
                }
                findings.push(Finding {
                    row: row.origin,
                    column: rule.column.clone(),
                    rule: rule.kind.label(),
                    severity: rule.severity,
                    message,
                });
            }
        }
    }

    let stats = ValidationStats {
        total_rows: dataset.len(),
        rows_with_errors: error_rows.len(),
        total_findings: findings.len(),
        errors,
        warnings,
    };

    Ok(ValidationReport {
        findings,
        skipped_rules,
        stats,
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_pattern(value: &Value, regex: &Regex) -> Option<String> {
    if is_blank(value) {
        return None;
    }
    let text = value.display_text();
    if regex.is_match(&text) {
        None
    } else {
        Some(format!("'{text}' does not match pattern"))
    }
}

/// One validator per rule kind; the single exhaustive match.
fn check(kind: &RuleKind, value: &Value) -> Option<String> {
    if matches!(kind, RuleKind::Required) {
        return if is_blank(value) {
            Some("value is required".into())
        } else {
            None
        };
    }
    if is_blank(value) {
        return None;
    }

    let text = value.display_text();
    match kind {
        RuleKind::Required => unreachable!("handled above"),
        RuleKind::Numeric => match value.strict_number() {
            Some(_) => None,
            None => Some(format!("'{text}' is not a number")),
        },
        RuleKind::Integer => match value.strict_number() {
            Some(n) if n.fract() == 0.0 => None,
            Some(_) => Some(format!("'{text}' is not a whole number")),
            None => Some(format!("'{text}' is not a number")),
        },
        RuleKind::Positive => match value.strict_number() {
            Some(n) if n > 0.0 => None,
            Some(_) => Some(format!("'{text}' is not positive")),
            None => Some(format!("'{text}' is not a number")),
        },
        RuleKind::Min(threshold) => match value.strict_number() {
            Some(n) if n >= *threshold => None,
            Some(n) => Some(format!("{n} is below the minimum of {threshold}")),
            None => Some(format!("'{text}' is not a number")),
        },
        RuleKind::Max(threshold) => match value.strict_number() {
            Some(n) if n <= *threshold => None,
            Some(n) => Some(format!("{n} is above the maximum of {threshold}")),
            None => Some(format!("'{text}' is not a number")),
        },
        RuleKind::Length(expected) => {
            let count = text.chars().count();
            if count == *expected {
                None
            } else {
                Some(format!("length {count}, expected exactly {expected}"))
            }
        }
        RuleKind::MinLength(minimum) => {
            let count = text.chars().count();
            if count >= *minimum {
                None
            } else {
                Some(format!("length {count}, expected at least {minimum}"))
            }
        }
        RuleKind::OneOf(allowed) => {
            if allowed.iter().any(|a| *a == text) {
                None
            } else {
                Some(format!("'{text}' is not in the allowed list"))
            }
        }
        RuleKind::Pattern(_) => unreachable!("patterns are pre-compiled"),
        RuleKind::Unknown(_) => unreachable!("unknown kinds are skipped"),
    }
}
