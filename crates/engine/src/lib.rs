//! `rowsight-engine` — Tabular matching and rule-evaluation engine.
//!
//! Pure engine crate: receives pre-loaded datasets, returns classified
//! results. No CLI, IO or UI dependencies. Every operation is a pure
//! function over immutable dataset snapshots; running the same operation
//! twice on identical inputs yields identical output, ordering included.

pub mod aggregate;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod explain;
pub mod index;
pub mod lookup;
pub mod reconcile;
pub mod rules;

pub use aggregate::{AggregateConfig, AggregateOp, AggregateResult, Predicate, PredicateOp};
pub use config::RuleSetConfig;
pub use duplicates::{find_duplicates, DuplicateReport};
pub use error::EngineError;
pub use index::{full_outer_match, JoinOutput, KeyIndex};
pub use lookup::{LookupConfig, LookupOutcome, LookupResult};
pub use reconcile::{MatchClass, ReconcileConfig, ReconcileResult};
pub use rules::{Rule, RuleKind, Severity, ValidationReport};
