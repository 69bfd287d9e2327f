//! Parametric statistical tests for disease/control comparisons.
//!
//! This module implements t-tests optimized for sparse single-cell expression matrices. Summary
//! statistics are accumulated in one pass over each group's rows, so testing thousands of genes
//! stays cheap even for large cell counts.

use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::FloatOpsTS;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::testing::{TTestType, TestResult};

/// Perform t-tests on all genes comparing two groups of cells.
///
/// # Arguments
///
/// * `matrix` - Sparse expression matrix (cells × genes)
/// * `group1_indices` - Row indices for the first group of cells
/// * `group2_indices` - Row indices for the second group of cells
/// * `test_type` - Type of t-test to perform (Student's or Welch's)
///
/// # Returns
///
/// Vector of `TestResult` objects, one per gene, containing t-statistics and p-values.
pub fn t_test_matrix_groups<T>(
    matrix: &CsrMatrix<T>,
    group1_indices: &[usize],
    group2_indices: &[usize],
    test_type: TTestType,
) -> anyhow::Result<Vec<TestResult<f64>>>
where
    T: FloatOpsTS,
{
    if group1_indices.is_empty() || group2_indices.is_empty() {
        return Err(anyhow::anyhow!("Group indices cannot be empty"));
    }

    let n_genes = matrix.ncols();
    let (group1_sums, group1_sum_squares) = accumulate_gene_statistics(matrix, group1_indices);
    let (group2_sums, group2_sum_squares) = accumulate_gene_statistics(matrix, group2_indices);

    let n1 = group1_indices.len() as f64;
    let n2 = group2_indices.len() as f64;

    let results = (0..n_genes)
        .map(|gene_idx| {
            fast_t_test_from_sums(
                group1_sums[gene_idx],
                group1_sum_squares[gene_idx],
                n1,
                group2_sums[gene_idx],
                group2_sum_squares[gene_idx],
                n2,
                test_type,
            )
        })
        .collect();

    Ok(results)
}

/// Per-gene sums and sums of squares over a group of cells. Absent sparse entries contribute
/// zero to both accumulators but still count toward the group size.
fn accumulate_gene_statistics<T>(
    matrix: &CsrMatrix<T>,
    indices: &[usize],
) -> (Vec<f64>, Vec<f64>)
where
    T: FloatOpsTS,
{
    let mut sums = vec![0.0; matrix.ncols()];
    let mut sum_squares = vec![0.0; matrix.ncols()];
    for &row in indices {
        let lane = matrix.row(row);
        for (&col, value) in lane.col_indices().iter().zip(lane.values()) {
            let v = value.to_f64().unwrap_or(0.0);
            sums[col] += v;
            sum_squares[col] += v * v;
        }
    }
    (sums, sum_squares)
}

/// Perform a t-test using precomputed summary statistics.
///
/// Computes t-tests directly from sum and sum-of-squares, avoiding the need to store or
/// iterate through the original data again.
///
/// # Arguments
///
/// * `sum1`, `sum_sq1`, `n1` - Sum, sum of squares, and count for group 1
/// * `sum2`, `sum_sq2`, `n2` - Sum, sum of squares, and count for group 2
/// * `test_type` - Type of t-test to perform (Student's or Welch's)
///
/// # Returns
///
/// `TestResult` containing the t-statistic and p-value.
pub fn fast_t_test_from_sums(
    sum1: f64,
    sum_sq1: f64,
    n1: f64,
    sum2: f64,
    sum_sq2: f64,
    n2: f64,
    test_type: TTestType,
) -> TestResult<f64> {
    // Early exit for insufficient sample sizes
    if n1 < 2.0 || n2 < 2.0 {
        return TestResult::new(0.0, 1.0);
    }

    let mean1 = sum1 / n1;
    let mean2 = sum2 / n2;

    // Variances via the computational formula
    let var1 = (sum_sq1 - sum1 * sum1 / n1) / (n1 - 1.0);
    let var2 = (sum_sq2 - sum2 * sum2 / n2) / (n2 - 1.0);

    let mean_diff = mean1 - mean2;

    let (t_stat, df) = match test_type {
        TTestType::Student => {
            // Pooled variance
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
            let std_err = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
            (mean_diff / std_err, n1 + n2 - 2.0)
        }
        TTestType::Welch => {
            let term1 = var1 / n1;
            let term2 = var2 / n2;
            let combined_var = term1 + term2;
            let t = mean_diff / combined_var.sqrt();

            // Welch-Satterthwaite equation for degrees of freedom
            let df = combined_var * combined_var
                / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));
            (t, df)
        }
    };

    let p_value = t_test_p_value(t_stat, df);
    TestResult::new(t_stat, p_value)
}

#[inline]
fn t_test_p_value(t_stat: f64, df: f64) -> f64 {
    if !t_stat.is_finite() {
        // Perfect separation gives an infinite statistic; undefined statistics
        // (zero variance, zero difference) are not evidence against the null.
        return if t_stat.is_infinite() { 0.0 } else { 1.0 };
    }

    if df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    let abs_t = t_stat.abs();

    if abs_t < 0.001 {
        return 1.0;
    }

    // Normal approximation for large degrees of freedom
    if df > 100.0 {
        let normal = Normal::new(0.0, 1.0).unwrap();
        return (2.0 * (1.0 - normal.cdf(abs_t))).clamp(0.0, 1.0);
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * (1.0 - t_dist.cdf(abs_t))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    #[test]
    fn separated_groups_are_significant() {
        // Group 1: [1, 2, 3], group 2: [7, 8, 9]
        let result = fast_t_test_from_sums(6.0, 14.0, 3.0, 24.0, 194.0, 3.0, TTestType::Student);
        assert!(result.p_value < 0.05);
        assert!(result.statistic.abs() > 2.0);
    }

    #[test]
    fn identical_groups_are_not_significant() {
        // Both groups: [5, 5, 5]
        for test_type in [TTestType::Student, TTestType::Welch] {
            let result = fast_t_test_from_sums(15.0, 75.0, 3.0, 15.0, 75.0, 3.0, test_type);
            assert!(result.statistic.abs() < 0.001 || result.statistic.is_nan());
            assert!(result.p_value > 0.9);
        }
    }

    #[test]
    fn insufficient_samples_fall_back_to_null() {
        let result = fast_t_test_from_sums(5.0, 25.0, 1.0, 15.0, 75.0, 3.0, TTestType::Student);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn matrix_groups_test_each_gene() {
        // 6 cells × 3 genes:
        // Gene 0: [1,1,1] vs [5,5,5] — perfect separation
        // Gene 1: [3,3,3] vs [3,3,3] — no difference
        // Gene 2: [0,0,1] vs [2,3,4] — moderate difference
        let mut coo = CooMatrix::new(6, 3);
        for (row, value) in [1.0, 1.0, 1.0, 5.0, 5.0, 5.0].iter().enumerate() {
            coo.push(row, 0, *value);
        }
        for row in 0..6 {
            coo.push(row, 1, 3.0);
        }
        for (row, value) in [(2, 1.0), (3, 2.0), (4, 3.0), (5, 4.0)] {
            coo.push(row, 2, value);
        }
        let matrix = CsrMatrix::from(&coo);

        let results =
            t_test_matrix_groups(&matrix, &[0, 1, 2], &[3, 4, 5], TTestType::Student).unwrap();

        assert!(results[0].statistic.is_infinite());
        assert!(results[0].p_value < 0.001);
        assert!(results[1].p_value > 0.9);
        assert!(results[2].p_value < 0.1);
    }

    #[test]
    fn empty_groups_are_rejected() {
        let matrix = CsrMatrix::from(&CooMatrix::<f64>::new(4, 2));
        assert!(t_test_matrix_groups(&matrix, &[], &[0, 1], TTestType::Student).is_err());
        assert!(t_test_matrix_groups(&matrix, &[0, 1], &[], TTestType::Welch).is_err());
    }
}
