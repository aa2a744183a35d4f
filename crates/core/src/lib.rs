//! `rowsight-core` — Shared data model for the rowsight engines.
//!
//! Values, rows, datasets and match-key construction. Pure types: no IO,
//! no UI, no mutation of caller data once a dataset is built.

pub mod dataset;
pub mod key;
pub mod value;

pub use dataset::{Dataset, Row};
pub use key::{build_key, KeyMode, KEY_SEPARATOR};
pub use value::Value;
