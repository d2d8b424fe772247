//! tablestats: Decision-tree statistical analysis over tabular data
//!
//! This crate picks and runs the appropriate statistical test sequence for a
//! table (normality and homogeneity checks, parametric or non-parametric
//! comparisons, post-hoc procedures) and records every outcome with a
//! human-readable interpretation.

pub mod engine;
pub mod errors;
pub mod figures;
pub mod pairwise;
pub mod relation;
pub mod table;
pub mod tests;
pub mod types;

pub use engine::TableStats;
pub use errors::{StatsError, StatsResult};
pub use pairwise::PairwiseMatrix;
pub use relation::TableRelationStats;
pub use table::{Column, ColumnValues, Table};
pub use types::*;
