use std::fmt;

/// Structured engine failures. Every variant names the configuration
/// value that caused it; the UI layer translates these to messages.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A configured key column is absent from a dataset's schema.
    KeyColumnNotFound { dataset: String, column: String },
    /// Any other configured column is absent from a dataset's schema.
    ColumnNotFound { dataset: String, column: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty rule set, missing sum column, etc.).
    ConfigValidation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyColumnNotFound { dataset, column } => {
                write!(f, "dataset '{dataset}': key column '{column}' not found")
            }
            Self::ColumnNotFound { dataset, column } => {
                write!(f, "dataset '{dataset}': column '{column}' not found")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
