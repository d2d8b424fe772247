//! Pairwise comparison runner and the label-indexed matrix its results are
//! reported in.

use serde::Serialize;
use tracing::debug;

use crate::errors::{StatsError, StatsResult};
use crate::table::Table;
use crate::tests::correlation::{pearson_r, spearman_rho};
use crate::tests::parametric::pooled_t;
use crate::types::{TestDetails, TestName, TestOutcome};

/// Label-indexed matrix of optional values. Square after a pairwise run;
/// reference slicing keeps all rows but a single column.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl PairwiseMatrix {
    /// Square matrix over the given labels, all cells empty.
    pub fn new_square(labels: &[String]) -> Self {
        let n = labels.len();
        Self {
            row_labels: labels.to_vec(),
            col_labels: labels.to_vec(),
            cells: vec![vec![None; n]; n],
        }
    }

    pub fn from_cells(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
    ) -> StatsResult<Self> {
        if cells.len() != row_labels.len()
            || cells.iter().any(|row| row.len() != col_labels.len())
        {
            return Err(StatsError::InvalidInput(
                "Matrix shape does not match its labels.".to_string(),
            ));
        }
        Ok(Self {
            row_labels,
            col_labels,
            cells,
        })
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        self.cells[row][col] = value;
    }

    /// Writes both (i, j) and (j, i). Only valid on square matrices.
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: Option<f64>) {
        self.cells[i][j] = value;
        self.cells[j][i] = value;
    }

    pub fn set_diagonal(&mut self, value: f64) {
        for i in 0..self.cells.len().min(self.col_labels.len()) {
            self.cells[i][i] = Some(value);
        }
    }

    /// Keeps all rows but only the named column.
    pub fn slice_column(&self, label: &str) -> StatsResult<PairwiseMatrix> {
        let col = self
            .col_labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| StatsError::InvalidReference {
                column: label.to_string(),
                valid: self.col_labels.clone(),
            })?;
        Ok(PairwiseMatrix {
            row_labels: self.row_labels.clone(),
            col_labels: vec![label.to_string()],
            cells: self.cells.iter().map(|row| vec![row[col]]).collect(),
        })
    }

    /// All cells in row-major order, as the correction procedures consume
    /// them.
    pub fn flatten(&self) -> Vec<Option<f64>> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Same-shape matrix with the given cells substituted in row-major
    /// order.
    pub fn with_flat_cells(&self, flat: &[Option<f64>]) -> StatsResult<PairwiseMatrix> {
        if flat.len() != self.row_labels.len() * self.col_labels.len() {
            return Err(StatsError::InvalidInput(
                "Flat cell count does not match the matrix shape.".to_string(),
            ));
        }
        let width = self.col_labels.len();
        let cells = flat.chunks(width).map(|chunk| chunk.to_vec()).collect();
        Ok(PairwiseMatrix {
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            cells,
        })
    }

    /// Number of unique off-diagonal defined cells below 0.05. Only
    /// meaningful for square symmetric p-value matrices.
    pub fn significant_unique_pairs(&self) -> usize {
        let mut count = 0;
        for i in 0..self.row_labels.len() {
            for j in (i + 1)..self.col_labels.len() {
                if let Some(p) = self.cells[i][j] {
                    if !p.is_nan() && p < 0.05 {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}

/// Student's t-test over all column pairs (or reference vs. the rest).
pub fn student_independent_pairwise(
    table: &Table,
    reference_column: Option<&str>,
) -> StatsResult<TestOutcome> {
    pairwise_analysis(
        table,
        reference_column,
        pooled_t,
        TestName::StudentIndependentPairwise,
        false,
    )
}

/// Pearson correlation over all column pairs (or reference vs. the rest).
pub fn pearson_pairwise(
    table: &Table,
    reference_column: Option<&str>,
) -> StatsResult<TestOutcome> {
    pairwise_analysis(
        table,
        reference_column,
        pearson_r,
        TestName::PearsonCorrelation,
        true,
    )
}

/// Spearman correlation over all column pairs (or reference vs. the rest).
pub fn spearman_pairwise(
    table: &Table,
    reference_column: Option<&str>,
) -> StatsResult<TestOutcome> {
    pairwise_analysis(
        table,
        reference_column,
        spearman_rho,
        TestName::SpearmanCorrelation,
        true,
    )
}

// Shared driver. Each pair is compared on its co-present rows; pairs with
// fewer than two stay empty. The diagonal carries the p = 1.0 identity.
fn pairwise_analysis<F>(
    table: &Table,
    reference_column: Option<&str>,
    compare: F,
    test_name: TestName,
    correlation: bool,
) -> StatsResult<TestOutcome>
where
    F: Fn(&[f64], &[f64]) -> StatsResult<(f64, f64)>,
{
    let columns: Vec<String> = table
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    if columns.len() < 2 {
        return Err(StatsError::InsufficientData(
            "The table must contain at least two columns for pairwise comparisons.".to_string(),
        ));
    }
    if let Some(reference) = reference_column {
        if !columns.iter().any(|c| c == reference) {
            return Err(StatsError::InvalidReference {
                column: reference.to_string(),
                valid: columns,
            });
        }
    }

    let mut p_values = PairwiseMatrix::new_square(&columns);
    p_values.set_diagonal(1.0);

    let mut valid_comparisons = 0;
    let mut significant_count = 0;

    for i in 0..columns.len() {
        for j in (i + 1)..columns.len() {
            if let Some(reference) = reference_column {
                if columns[i] != reference && columns[j] != reference {
                    continue;
                }
            }

            let a = table.numeric_values(&columns[i])?;
            let b = table.numeric_values(&columns[j])?;
            let (paired_a, paired_b) = drop_incomplete_pairs(a, b);
            if paired_a.len() < 2 {
                continue;
            }

            // a degenerate pair (constant data) stays an empty cell rather
            // than aborting the whole matrix
            let Ok((_, p_value)) = compare(&paired_a, &paired_b) else {
                continue;
            };
            p_values.set_symmetric(i, j, Some(p_value));
            valid_comparisons += 1;
            if p_value < 0.05 {
                significant_count += 1;
            }
        }
    }

    if valid_comparisons == 0 {
        return Err(StatsError::InsufficientData(
            "No valid pairs with data found for statistical analysis.".to_string(),
        ));
    }
    debug!(
        test = %test_name,
        valid_comparisons,
        significant_count,
        "pairwise analysis"
    );

    let comparison_matrix = match reference_column {
        Some(reference) => p_values.slice_column(reference)?,
        None => p_values,
    };

    let result_text = if correlation {
        if significant_count > 0 {
            format!(
                "Significant correlations found in {significant_count} of {valid_comparisons} pairwise comparisons."
            )
        } else {
            "No significant pairwise correlations found.".to_string()
        }
    } else if significant_count > 0 {
        format!(
            "Significant differences found in {significant_count} of {valid_comparisons} pairwise comparisons."
        )
    } else {
        "No significant pairwise differences found.".to_string()
    };

    let details = if correlation {
        TestDetails::CorrelationPairwise {
            p_values: comparison_matrix,
            significant_comparisons: significant_count,
            total_comparisons: valid_comparisons,
        }
    } else {
        TestDetails::StudentPairwise {
            p_values: comparison_matrix,
            significant_comparisons: significant_count,
            total_comparisons: valid_comparisons,
        }
    };

    Ok(TestOutcome::new(
        test_name,
        result_text,
        None,
        None,
        None,
        details,
    ))
}

fn drop_incomplete_pairs(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .unzip()
}
