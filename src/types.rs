use std::fmt;

use serde::Serialize;

use crate::figures::Figure;
use crate::pairwise::PairwiseMatrix;

/// Closed enumeration of every statistical test the engine can run.
///
/// `as_str` yields the literal display names; these strings are part of the
/// downstream summary contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TestName {
    ShapiroWilk,
    KolmogorovSmirnov,
    NormalitySummary,
    Bartlett,
    Levene,
    ChiSquaredAdjustment,
    ChiSquaredIndependence,
    McNemar,
    StudentIndependent,
    StudentPaired,
    StudentIndependentPairwise,
    Anova,
    MannWhitney,
    WilcoxonSignedRank,
    KruskalWallis,
    Friedman,
    TukeyHsd,
    Dunn,
    PearsonCorrelation,
    SpearmanCorrelation,
}

impl TestName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestName::ShapiroWilk => "Shapiro-Wilk",
            TestName::KolmogorovSmirnov => "Kolmogorov-Smirnov (Lilliefors)",
            TestName::NormalitySummary => "Normality summary",
            TestName::Bartlett => "Bartlett",
            TestName::Levene => "Levene",
            TestName::ChiSquaredAdjustment => "Chi-squared adjustment",
            TestName::ChiSquaredIndependence => "Chi-squared independence",
            TestName::McNemar => "McNemar",
            TestName::StudentIndependent => "Student t-test (independent)",
            TestName::StudentPaired => "Student t-test (paired)",
            TestName::StudentIndependentPairwise => "Student t-test (independent paired wise)",
            TestName::Anova => "ANOVA",
            TestName::MannWhitney => "Mann-Whitney",
            TestName::WilcoxonSignedRank => "Wilcoxon signed-rank",
            TestName::KruskalWallis => "Kruskal-Wallis",
            TestName::Friedman => "Friedman",
            TestName::TukeyHsd => "Tukey HSD",
            TestName::Dunn => "Dunn",
            TestName::PearsonCorrelation => "Pearson correlation",
            TestName::SpearmanCorrelation => "Spearman correlation",
        }
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test-specific structured data, one variant per test family.
///
/// The variant carried by a [`TestOutcome`] must match its `test_name`'s
/// family; consumers pattern-match on the name to know which variant to
/// expect.
#[derive(Debug, Clone, Serialize)]
pub enum TestDetails {
    Normality {
        sample_size: usize,
    },
    NormalitySummary {
        all_normal: bool,
        test_used: &'static str,
        result_texts: Vec<String>,
    },
    Homogeneity {
        groups_count: usize,
    },
    ChiSquaredAdjustment {
        categories: usize,
        expected_freq: Vec<f64>,
    },
    ChiSquaredIndependence {
        degrees_of_freedom: usize,
        expected_frequencies: Vec<Vec<f64>>,
        raw_data: Vec<Vec<u64>>,
    },
    McNemar,
    StudentIndependent {
        degrees_of_freedom: f64,
        sample_sizes: [usize; 2],
    },
    StudentPaired {
        pairs_count: usize,
    },
    Anova {
        groups_count: usize,
        total_observations: usize,
    },
    TwoGroupNonParametric {
        sample_sizes: [usize; 2],
    },
    PairedNonParametric {
        pairs_count: usize,
    },
    MultiGroupNonParametric {
        groups_count: usize,
        total_observations: usize,
    },
    Friedman {
        conditions_count: usize,
        subjects_count: usize,
    },
    TukeyHsd {
        p_values: PairwiseMatrix,
        significant_pairs: Vec<String>,
    },
    Dunn {
        pairwise_matrix: PairwiseMatrix,
        adjustment_method: &'static str,
        significant_comparisons: usize,
    },
    StudentPairwise {
        p_values: PairwiseMatrix,
        significant_comparisons: usize,
        total_comparisons: usize,
    },
    CorrelationPairwise {
        p_values: PairwiseMatrix,
        significant_comparisons: usize,
        total_comparisons: usize,
    },
    Bonferroni {
        original_p_values: Vec<f64>,
        corrected_p_values: Vec<f64>,
        adjustment_method: &'static str,
        significant_comparisons: usize,
        total_comparisons: usize,
        corrected_alpha: f64,
    },
    Scheffe {
        original_p_values: Vec<f64>,
        corrected_p_values: Vec<f64>,
        adjustment_method: &'static str,
        significant_comparisons: usize,
        total_comparisons: usize,
        scheffe_multiplier: f64,
        num_groups: usize,
    },
    BenjaminiHochberg {
        original_p_values: Vec<f64>,
        corrected_p_values: Vec<f64>,
        adjustment_method: &'static str,
        significant_comparisons: usize,
        total_comparisons: usize,
        false_discovery_rate: f64,
    },
    Holm {
        original_p_values: Vec<f64>,
        corrected_p_values: Vec<f64>,
        adjustment_method: &'static str,
        significant_comparisons: usize,
        total_comparisons: usize,
    },
    TukeyCorrection {
        original_p_values: Vec<f64>,
        corrected_p_values: Vec<f64>,
        adjustment_method: &'static str,
        significant_comparisons: usize,
        total_comparisons: usize,
    },
}

/// One immutable record per executed test.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub test_name: TestName,
    pub result_text: String,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub figure: Option<Figure>,
    pub details: TestDetails,
    /// `{:.2e}` rendering of `p_value`, precomputed for display layers.
    pub p_value_scientific: Option<String>,
    /// `{:.2e}` rendering of `statistic`, precomputed for display layers.
    pub statistic_scientific: Option<String>,
}

impl TestOutcome {
    pub fn new(
        test_name: TestName,
        result_text: String,
        statistic: Option<f64>,
        p_value: Option<f64>,
        figure: Option<Figure>,
        details: TestDetails,
    ) -> Self {
        Self {
            test_name,
            result_text,
            statistic,
            p_value,
            figure,
            details,
            p_value_scientific: p_value.map(|p| format!("{:.2e}", p)),
            statistic_scientific: statistic.map(|s| format!("{:.2e}", s)),
        }
    }

    /// Significance classification at the 0.05 threshold, `None` when the
    /// test reports no single p-value (post-hoc matrices).
    pub fn is_significant(&self) -> Option<bool> {
        self.p_value.map(|p| p < 0.05)
    }
}

/// Ordered, append-only log of all test results for one analysis session.
///
/// Insertion order is execution order; entries are never mutated or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultHistory {
    results: Vec<TestOutcome>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: TestOutcome) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[TestOutcome] {
        &self.results
    }

    pub fn last_result(&self) -> Option<&TestOutcome> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn contains(&self, test_name: TestName) -> bool {
        self.results.iter().any(|r| r.test_name == test_name)
    }

    /// Text summary handed verbatim to a downstream summarizer.
    ///
    /// Exact format per entry is `"Test: {name}\nResult: {text}\n"`, joined
    /// by blank lines. This shape is a wire contract; do not alter casually.
    pub fn ai_text_summary(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("Test: {}\nResult: {}\n", r.test_name, r.result_text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
