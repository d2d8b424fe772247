//! Decision-tree analysis engine: picks and runs the appropriate test
//! sequence for a table, recording every outcome in order.

use tracing::debug;

use crate::errors::{StatsError, StatsResult};
use crate::pairwise::{student_independent_pairwise, PairwiseMatrix};
use crate::table::Table;
use crate::tests::{
    anova, bartlett, bonferroni, chi_squared_adjustment, chi_squared_independence, dunn,
    friedman, kruskal_wallis, levene, lilliefors, mann_whitney, mcnemar, scheffe,
    shapiro_wilk, student_independent, student_paired, tukey_hsd, tukey_on_matrix,
    wilcoxon_signed_rank,
};
use crate::types::{ResultHistory, TestDetails, TestName, TestOutcome};

/// Columns are routed through Shapiro-Wilk below this row count and
/// through Lilliefors at or above it.
const SHAPIRO_ROW_LIMIT: usize = 50;

/// Above this column count the pairwise runner switches from Bonferroni to
/// the Tukey family correction, which scales better with many comparisons.
const BONFERRONI_COLUMN_LIMIT: usize = 30;

/// Stateful analysis session over one table.
///
/// Construction drops incomplete rows; every executed test is appended to
/// the session history in execution order.
pub struct TableStats {
    table: Table,
    columns_are_independent: bool,
    history: ResultHistory,
}

impl TableStats {
    pub fn new(table: Table, columns_are_independent: bool) -> Self {
        Self {
            table: table.drop_incomplete_rows(),
            columns_are_independent,
            history: ResultHistory::new(),
        }
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

    /// Walks the decision tree for the table and returns the final test
    /// outcome. All intermediate outcomes land in the history.
    pub fn run_statistical_analysis(&mut self) -> StatsResult<TestOutcome> {
        if self.columns_are_quantitative() {
            self.run_quantitative_branch()
        } else {
            self.run_qualitative_branch()
        }
    }

    fn run_qualitative_branch(&mut self) -> StatsResult<TestOutcome> {
        let names: Vec<String> = self
            .table
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        debug!(columns = names.len(), "qualitative branch");

        let outcome = match names.len() {
            1 => {
                let counts = self.table.value_counts(&names[0])?;
                let observed: Vec<u64> = counts.iter().map(|(_, n)| *n).collect();
                chi_squared_adjustment(&observed)?
            }
            2 => {
                let (_, _, matrix) = self.table.crosstab(&names[0], &names[1])?;
                if self.columns_are_independent {
                    chi_squared_independence(&matrix)?
                } else {
                    mcnemar(&matrix)?
                }
            }
            _ => {
                return Err(StatsError::UnsupportedConfiguration(
                    "Statistical analysis of more than two qualitative columns is not supported."
                        .to_string(),
                ))
            }
        };

        self.history.add_result(outcome.clone());
        Ok(outcome)
    }

    fn run_quantitative_branch(&mut self) -> StatsResult<TestOutcome> {
        if self.table.column_count() < 2 {
            return Err(StatsError::UnsupportedConfiguration(
                "Quantitative analysis requires at least two columns.".to_string(),
            ));
        }

        let all_normal = self.run_normality_step()?;
        let homogeneous = self.run_homogeneity_step(all_normal)?;
        let parametric = all_normal && homogeneous;
        debug!(all_normal, homogeneous, parametric, "assumption checks done");

        let groups = self.named_groups();
        let two_columns = groups.len() == 2;
        let outcome = if two_columns {
            let (name1, g1) = (groups[0].0.as_str(), groups[0].1.as_slice());
            let (name2, g2) = (groups[1].0.as_str(), groups[1].1.as_slice());
            match (parametric, self.columns_are_independent) {
                (true, true) => student_independent(g1, g2, Some(name1), Some(name2))?,
                (true, false) => student_paired(g1, g2, Some(name1), Some(name2))?,
                (false, true) => mann_whitney(g1, g2, Some(name1), Some(name2))?,
                (false, false) => wilcoxon_signed_rank(g1, g2, Some(name1), Some(name2))?,
            }
        } else {
            let refs: Vec<(&str, &[f64])> = groups
                .iter()
                .map(|(name, values)| (name.as_str(), values.as_slice()))
                .collect();
            match (parametric, self.columns_are_independent) {
                (true, true) => anova(&refs)?,
                (true, false) => {
                    return Err(StatsError::UnsupportedConfiguration(
                        "Repeated measures ANOVA is not supported.".to_string(),
                    ))
                }
                (false, true) => kruskal_wallis(&refs)?,
                (false, false) => friedman(&refs)?,
            }
        };
        self.history.add_result(outcome.clone());

        // a significant omnibus result chains straight into its post-hoc
        if !two_columns && outcome.is_significant() == Some(true) {
            let refs: Vec<(&str, &[f64])> = groups
                .iter()
                .map(|(name, values)| (name.as_str(), values.as_slice()))
                .collect();
            let posthoc = match outcome.test_name {
                TestName::Anova => tukey_hsd(&refs)?,
                _ => dunn(&refs)?,
            };
            debug!(test = %posthoc.test_name, "post-hoc chained");
            self.history.add_result(posthoc.clone());
            return Ok(posthoc);
        }

        Ok(outcome)
    }

    // Tests every column for normality and folds the outcomes into a single
    // summary record. The individual column results are not kept.
    fn run_normality_step(&mut self) -> StatsResult<bool> {
        let use_shapiro = self.table.row_count() < SHAPIRO_ROW_LIMIT;
        let test_used = if use_shapiro {
            "Shapiro-Wilk"
        } else {
            "Kolmogorov-Smirnov"
        };
        debug!(test_used, rows = self.table.row_count(), "normality step");

        let mut all_normal = true;
        let mut result_texts = Vec::new();
        for (name, values) in self.named_groups() {
            let outcome = if use_shapiro {
                shapiro_wilk(&values)?
            } else {
                lilliefors(&values)?
            };
            if outcome.p_value.unwrap_or(0.0) <= 0.05 {
                all_normal = false;
            }
            result_texts.push(format!("{name}: {}", outcome.result_text));
        }

        let result_text = if all_normal {
            "All columns are normal".to_string()
        } else {
            "At least one column is not normal".to_string()
        };
        self.history.add_result(TestOutcome::new(
            TestName::NormalitySummary,
            result_text,
            None,
            None,
            None,
            TestDetails::NormalitySummary {
                all_normal,
                test_used,
                result_texts,
            },
        ));
        Ok(all_normal)
    }

    fn run_homogeneity_step(&mut self, all_normal: bool) -> StatsResult<bool> {
        let groups = self.named_groups();
        let refs: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
        let outcome = if all_normal {
            bartlett(&refs)?
        } else {
            levene(&refs)?
        };
        let homogeneous = outcome.p_value.unwrap_or(0.0) > 0.05;
        self.history.add_result(outcome);
        Ok(homogeneous)
    }

    /// Pairwise t-tests over all columns followed by a multiple-comparison
    /// correction. Requires a prior significant ANOVA with its Tukey HSD
    /// post-hoc in this session's history.
    pub fn run_student_independent_pairwise(
        &mut self,
        reference_column: Option<&str>,
    ) -> StatsResult<TestOutcome> {
        if !self.history.contains(TestName::Anova) {
            return Err(StatsError::PrerequisiteNotMet {
                missing: "ANOVA",
                requested: "Student t-test (independent paired wise)",
            });
        }
        if !self.history.contains(TestName::TukeyHsd) {
            return Err(StatsError::PrerequisiteNotMet {
                missing: "Tukey HSD",
                requested: "Student t-test (independent paired wise)",
            });
        }

        let raw = student_independent_pairwise(&self.table, reference_column)?;
        self.history.add_result(raw.clone());

        let TestDetails::StudentPairwise { p_values, .. } = &raw.details else {
            return Err(StatsError::InvalidInput(
                "Pairwise run produced no p-value matrix.".to_string(),
            ));
        };

        let corrected = self.apply_pairwise_correction(p_values)?;
        self.history.add_result(corrected.clone());
        Ok(corrected)
    }

    fn apply_pairwise_correction(
        &self,
        p_values: &PairwiseMatrix,
    ) -> StatsResult<TestOutcome> {
        if self.columns_are_independent {
            if self.table.column_count() < BONFERRONI_COLUMN_LIMIT {
                debug!("bonferroni correction");
                bonferroni(p_values)
            } else {
                debug!("tukey family correction");
                tukey_on_matrix(p_values)
            }
        } else {
            debug!("scheffe correction");
            scheffe(p_values, self.table.column_count())
        }
    }

    /// Follow-up test the session history makes applicable, or `None` when
    /// there is nothing to suggest.
    pub fn suggested_additional_tests(&self) -> Option<TestName> {
        if self.history.contains(TestName::Anova)
            && !self.history.contains(TestName::StudentIndependentPairwise)
        {
            return Some(TestName::StudentIndependentPairwise);
        }
        None
    }

    fn named_groups(&self) -> Vec<(String, Vec<f64>)> {
        self.table
            .column_names()
            .iter()
            .filter_map(|name| {
                self.table
                    .numeric_values(name)
                    .ok()
                    .map(|v| (name.to_string(), v.to_vec()))
            })
            .collect()
    }
}
