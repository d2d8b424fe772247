//! Chi-squared family tests on categorical counts.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use crate::errors::{StatsError, StatsResult};
use crate::types::{TestDetails, TestName, TestOutcome};

/// Chi-squared goodness-of-fit test against the uniform expectation
/// (the mean of the observed counts).
pub fn chi_squared_adjustment(observed: &[u64]) -> StatsResult<TestOutcome> {
    let k = observed.len();
    if k < 2 {
        return Err(StatsError::InsufficientData(
            "Chi-squared adjustment requires at least two categories.".to_string(),
        ));
    }

    let total: u64 = observed.iter().sum();
    if total == 0 {
        return Err(StatsError::InsufficientData(
            "Chi-squared adjustment requires non-zero counts.".to_string(),
        ));
    }
    let expected = total as f64 / k as f64;

    let statistic: f64 = observed
        .iter()
        .map(|o| {
            let d = *o as f64 - expected;
            d * d / expected
        })
        .sum();

    let chi2 = ChiSquared::new((k - 1) as f64)?;
    let p_value = 1.0 - chi2.cdf(statistic);
    debug!(k, statistic, p_value, "chi-squared adjustment");

    let result_text = if p_value < 0.05 {
        "Observed frequencies significantly deviate from expected distribution.".to_string()
    } else {
        "Observed frequencies fit the expected distribution well.".to_string()
    };

    Ok(TestOutcome::new(
        TestName::ChiSquaredAdjustment,
        result_text,
        Some(statistic),
        Some(p_value),
        None,
        TestDetails::ChiSquaredAdjustment {
            categories: k,
            expected_freq: vec![expected; k],
        },
    ))
}

/// Chi-squared test of independence on a contingency table, with the Yates
/// continuity correction on 2x2 tables.
pub fn chi_squared_independence(table: &[Vec<u64>]) -> StatsResult<TestOutcome> {
    let n_rows = table.len();
    let n_cols = table.first().map(Vec::len).unwrap_or(0);
    if n_rows < 2 || n_cols < 2 {
        return Err(StatsError::InsufficientData(
            "Chi-squared independence requires at least a 2x2 table.".to_string(),
        ));
    }
    if table.iter().any(|row| row.len() != n_cols) {
        return Err(StatsError::InvalidInput(
            "Contingency table rows must all have the same length.".to_string(),
        ));
    }

    let row_sums: Vec<f64> = table
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect();
    let col_sums: Vec<f64> = (0..n_cols)
        .map(|j| table.iter().map(|row| row[j]).sum::<u64>() as f64)
        .collect();
    let total: f64 = row_sums.iter().sum();
    if row_sums.iter().any(|s| *s == 0.0) || col_sums.iter().any(|s| *s == 0.0) {
        return Err(StatsError::InsufficientData(
            "Contingency table has an empty row or column.".to_string(),
        ));
    }

    let df = (n_rows - 1) * (n_cols - 1);
    let yates = df == 1;

    let mut expected = vec![vec![0.0; n_cols]; n_rows];
    let mut statistic = 0.0;
    for i in 0..n_rows {
        for j in 0..n_cols {
            let e = row_sums[i] * col_sums[j] / total;
            expected[i][j] = e;
            let mut d = (table[i][j] as f64 - e).abs();
            if yates {
                d = (d - 0.5).max(0.0);
            }
            statistic += d * d / e;
        }
    }

    let chi2 = ChiSquared::new(df as f64)?;
    let p_value = 1.0 - chi2.cdf(statistic);
    debug!(n_rows, n_cols, statistic, p_value, "chi-squared independence");

    let result_text = if p_value < 0.05 {
        "Variables are significantly associated (not independent).".to_string()
    } else {
        "Variables appear to be independent.".to_string()
    };

    Ok(TestOutcome::new(
        TestName::ChiSquaredIndependence,
        result_text,
        Some(statistic),
        Some(p_value),
        None,
        TestDetails::ChiSquaredIndependence {
            degrees_of_freedom: df,
            expected_frequencies: expected,
            raw_data: table.to_vec(),
        },
    ))
}

/// McNemar's test on a 2x2 table of paired responses, continuity corrected.
pub fn mcnemar(table: &[Vec<u64>]) -> StatsResult<TestOutcome> {
    if table.len() != 2 || table.iter().any(|row| row.len() != 2) {
        return Err(StatsError::InvalidInput(
            "McNemar requires a 2x2 contingency table.".to_string(),
        ));
    }

    let b = table[0][1] as f64;
    let c = table[1][0] as f64;
    if b + c == 0.0 {
        return Err(StatsError::InsufficientData(
            "McNemar requires at least one discordant pair.".to_string(),
        ));
    }

    let statistic = ((b - c).abs() - 1.0).max(0.0).powi(2) / (b + c);
    let chi2 = ChiSquared::new(1.0)?;
    let p_value = 1.0 - chi2.cdf(statistic);
    debug!(statistic, p_value, "mcnemar");

    let result_text = if p_value < 0.05 {
        "Significant difference between paired categorical responses.".to_string()
    } else {
        "No significant difference between paired responses.".to_string()
    };

    Ok(TestOutcome::new(
        TestName::McNemar,
        result_text,
        Some(statistic),
        Some(p_value),
        None,
        TestDetails::McNemar,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_adjustment_uniform_expectation() {
        let result = chi_squared_adjustment(&[15, 25, 30, 20, 10]).unwrap();
        assert_relative_eq!(result.statistic.unwrap(), 12.5, epsilon = 1e-12);
        assert_relative_eq!(result.p_value.unwrap(), 0.014, epsilon = 1e-3);
        match result.details {
            TestDetails::ChiSquaredAdjustment {
                categories,
                expected_freq,
            } => {
                assert_eq!(categories, 5);
                assert_eq!(expected_freq, vec![20.0; 5]);
            }
            other => panic!("unexpected details: {other:?}"),
        }
        assert_eq!(
            result.result_text,
            "Observed frequencies significantly deviate from expected distribution."
        );
    }

    #[test]
    fn test_independence_yates_on_2x2() {
        let result =
            chi_squared_independence(&[vec![30, 10], vec![20, 40]]).unwrap();
        assert_relative_eq!(result.statistic.unwrap(), 15.0417, epsilon = 1e-3);
        assert!(result.p_value.unwrap() < 0.001);
        match result.details {
            TestDetails::ChiSquaredIndependence {
                degrees_of_freedom,
                expected_frequencies,
                ..
            } => {
                assert_eq!(degrees_of_freedom, 1);
                assert_relative_eq!(expected_frequencies[0][0], 20.0, epsilon = 1e-12);
                assert_relative_eq!(expected_frequencies[1][1], 30.0, epsilon = 1e-12);
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_mcnemar_continuity_corrected() {
        let result = mcnemar(&[vec![10, 5], vec![15, 20]]).unwrap();
        assert_relative_eq!(result.statistic.unwrap(), 4.05, epsilon = 1e-12);
        assert_relative_eq!(result.p_value.unwrap(), 0.0442, epsilon = 1e-3);
        assert_eq!(
            result.result_text,
            "Significant difference between paired categorical responses."
        );
    }

    #[test]
    fn test_mcnemar_no_discordant_pairs() {
        assert!(matches!(
            mcnemar(&[vec![10, 0], vec![0, 20]]),
            Err(StatsError::InsufficientData(_))
        ));
    }
}
