//! Correlation analysis engine over the numeric columns of a table.

use tracing::debug;

use crate::errors::{StatsError, StatsResult};
use crate::pairwise::{pearson_pairwise, spearman_pairwise};
use crate::table::Table;
use crate::tests::{pearson, spearman};
use crate::types::{ResultHistory, TestName, TestOutcome};

/// Stateful correlation session over one table.
///
/// With exactly two columns it runs the plain Pearson and Spearman tests
/// with scatter figures; with more it runs the pairwise variants, sliced to
/// the reference column when one is given.
#[derive(Debug)]
pub struct TableRelationStats {
    table: Table,
    reference_column: Option<String>,
    history: ResultHistory,
}

impl TableRelationStats {
    pub fn new(table: Table, reference_column: Option<&str>) -> StatsResult<Self> {
        let table = table.drop_incomplete_rows();
        if table.column_count() < 2 {
            return Err(StatsError::InsufficientData(
                "Correlation analysis requires at least two columns.".to_string(),
            ));
        }
        if !table.is_all_numeric() {
            return Err(StatsError::UnsupportedConfiguration(
                "Correlation analysis requires numeric columns.".to_string(),
            ));
        }
        if let Some(reference) = reference_column {
            if !table.has_column(reference) {
                return Err(StatsError::InvalidReference {
                    column: reference.to_string(),
                    valid: table
                        .column_names()
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                });
            }
        }
        Ok(Self {
            table,
            reference_column: reference_column.map(str::to_string),
            history: ResultHistory::new(),
        })
    }

    pub fn history(&self) -> &ResultHistory {
        &self.history
    }

    pub fn history_contains(&self, test_name: TestName) -> bool {
        self.history.contains(test_name)
    }

    pub fn count_columns(&self) -> usize {
        self.table.column_count()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }

    pub fn columns_are_quantitative(&self) -> bool {
        self.table.is_all_numeric()
    }

    /// Runs Pearson then Spearman over the table and returns the final
    /// outcome; both land in the history.
    pub fn run_correlation_analysis(&mut self) -> StatsResult<TestOutcome> {
        if self.table.column_count() == 2 {
            let names = self.table.column_names();
            let (x_name, y_name) = (names[0].to_string(), names[1].to_string());
            let x = self.table.numeric_values(&x_name)?.to_vec();
            let y = self.table.numeric_values(&y_name)?.to_vec();
            debug!(%x_name, %y_name, "two-column correlation");

            let pearson_outcome = pearson(&x, &y, Some(&x_name), Some(&y_name), true)?;
            self.history.add_result(pearson_outcome);
            let spearman_outcome = spearman(&x, &y, Some(&x_name), Some(&y_name), true)?;
            self.history.add_result(spearman_outcome.clone());
            return Ok(spearman_outcome);
        }

        let reference = self.reference_column.as_deref();
        debug!(
            columns = self.table.column_count(),
            reference,
            "pairwise correlation"
        );
        let pearson_outcome = pearson_pairwise(&self.table, reference)?;
        self.history.add_result(pearson_outcome);
        let spearman_outcome = spearman_pairwise(&self.table, reference)?;
        self.history.add_result(spearman_outcome.clone());
        Ok(spearman_outcome)
    }
}
