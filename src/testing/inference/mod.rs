use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::FloatOpsTS;

use crate::testing::{Alternative, TTestType, TestMethod, TestResult};

pub mod parametric;

pub mod nonparametric;

/// Two-group statistical tests over every gene of a sparse expression matrix.
///
/// Matrices are cells × genes; group indices select rows (cells) and results come back one
/// per column (gene).
pub trait MatrixStatTests<T>
where
    T: FloatOpsTS,
{
    fn t_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        test_type: TTestType,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;

    fn mann_whitney_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        alternative: Alternative,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;

    /// Dispatch on the configured test method, using a two-sided alternative.
    fn two_group_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        method: TestMethod,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;
}

impl<T> MatrixStatTests<T> for CsrMatrix<T>
where
    T: FloatOpsTS,
{
    fn t_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        test_type: TTestType,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        parametric::t_test_matrix_groups(self, group1_indices, group2_indices, test_type)
    }

    fn mann_whitney_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        alternative: Alternative,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        nonparametric::mann_whitney_matrix_groups(self, group1_indices, group2_indices, alternative)
    }

    fn two_group_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        method: TestMethod,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        match method {
            TestMethod::TTest(test_type) => {
                self.t_test(group1_indices, group2_indices, test_type)
            }
            TestMethod::MannWhitney => {
                self.mann_whitney_test(group1_indices, group2_indices, Alternative::TwoSided)
            }
        }
    }
}
