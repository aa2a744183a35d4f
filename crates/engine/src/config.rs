use serde::Deserialize;

use crate::error::EngineError;
use crate::rules::{Rule, RuleKind, Severity};

/// A stored rule-set document, as the UI persists it.
///
/// Rule tags stay strings at this layer; `compile` turns them into
/// `RuleKind` values, with unrecognized tags surviving as
/// `RuleKind::Unknown` so evaluation can report them.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetConfig {
    pub name: String,
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub column: String,
    pub rule: String,
    /// Numeric threshold, pattern or comma-separated allow-list,
    /// depending on the rule.
    #[serde(default)]
    pub threshold: Option<toml::Value>,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Error
}

impl RuleSetConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: RuleSetConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rules.is_empty() {
            return Err(EngineError::ConfigValidation(format!(
                "rule set '{}' has no rules",
                self.name
            )));
        }
        for spec in &self.rules {
            if spec.column.is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "rule set '{}': rule '{}' has no column",
                    self.name, spec.rule
                )));
            }
        }
        Ok(())
    }

    /// Compile specs into evaluatable rules.
    pub fn compile(&self) -> Vec<Rule> {
        self.rules
            .iter()
            .map(|spec| {
                let threshold = spec.threshold.as_ref().map(threshold_text);
                Rule::new(
                    spec.column.clone(),
                    RuleKind::parse(&spec.rule, threshold.as_deref()),
                    spec.severity,
                )
            })
            .collect()
    }
}

fn threshold_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(n) => n.to_string(),
        toml::Value::Float(n) => n.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}
