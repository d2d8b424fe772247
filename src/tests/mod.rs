//! Statistical test procedures.
//!
//! Each function is stateless, validates its input, and returns a
//! [`TestOutcome`](crate::types::TestOutcome) carrying the human-readable
//! interpretation alongside the raw statistic and p-value.

pub mod categorical;

pub use categorical::{chi_squared_adjustment, chi_squared_independence, mcnemar};
pub use correlation::{pearson, spearman};
pub use distributional::{lilliefors, shapiro_wilk};
pub use nonparametric::{friedman, kruskal_wallis, mann_whitney, wilcoxon_signed_rank};
pub use parametric::{anova, bartlett, levene, student_independent, student_paired};
pub use posthoc::{
    benjamini_hochberg, bonferroni, dunn, holm, scheffe, tukey_hsd, tukey_on_matrix,
};

/// Drops NaN cells from a column slice.
pub(crate) fn filter_nan(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Assigns 1-based ranks in input order, tied values getting the average of
/// the ranks they span.
pub(crate) fn assign_ranks(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut indexed: Vec<(usize, f64)> = data.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && (indexed[j].1 - indexed[i].1).abs() < 1e-10 {
            j += 1;
        }
        let avg_rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Tie correction term sum of t^3 - t over all tie groups.
pub(crate) fn tie_term(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mut term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && (sorted[j] - sorted[i]).abs() < 1e-10 {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            term += t * t * t - t;
        }
        i = j;
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_ranks_with_ties() {
        let ranks = assign_ranks(&[1.0, 3.0, 2.0, 3.0, 5.0]);
        assert_eq!(ranks, vec![1.0, 3.5, 2.0, 3.5, 5.0]);
    }

    #[test]
    fn test_tie_term() {
        // one tie group of size 2: 2^3 - 2 = 6
        assert_eq!(tie_term(&[1.0, 3.0, 2.0, 3.0, 5.0]), 6.0);
        assert_eq!(tie_term(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_filter_nan() {
        assert_eq!(filter_nan(&[1.0, f64::NAN, 2.0]), vec![1.0, 2.0]);
    }
}
