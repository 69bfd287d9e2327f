//! Differential-expression testing between disease and control cells.
//!
//! Given a combined expression matrix (cells × genes) with a condition label per cell, this
//! module runs a two-group statistical test per gene, applies multiple testing correction,
//! attaches log2 fold changes, and assembles the raw per-gene statistics table consumed by
//! the signature filter.

use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::{FloatOps, FloatOpsTS};

use crate::config::DeConfig;
use crate::signatures::GeneStat;
use crate::testing::inference::MatrixStatTests;

pub mod correction;
pub mod effect;
pub mod inference;

pub mod utils;

/// Statistical test used for the per-gene disease/control comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMethod {
    TTest(TTestType),
    MannWhitney,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TTestType {
    Student, // Equal variance
    Welch,   // Unequal variance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

/// Condition label for one cell of a combined disease/control dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Disease,
    Control,
}

impl Condition {
    /// The label used in the `group` column of result tables.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Disease => "disease",
            Condition::Control => "control",
        }
    }
}

/// Outcome of a single statistical test.
#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value (e.g., t-statistic, U statistic)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Effect size measurement, where the test provides one
    pub effect_size: Option<T>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            statistic,
            p_value,
            effect_size: None,
        }
    }

    pub fn with_effect_size(statistic: T, p_value: T, effect_size: T) -> Self {
        TestResult {
            statistic,
            p_value,
            effect_size: Some(effect_size),
        }
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}

/// Run the full differential-expression test for one tissue.
///
/// `matrix` is the combined disease/control dataset (cells × genes), `conditions` labels
/// each row, and `genes` names each column. Returns one [`GeneStat`] row per gene, in gene
/// order, with the test statistic as `score` and the disease condition as `group`.
///
/// # Errors
///
/// Fails when the gene list or condition vector does not match the matrix shape, when either
/// condition has no cells, or when the matrix has no genes.
pub fn rank_genes<T>(
    matrix: &CsrMatrix<T>,
    genes: &[String],
    conditions: &[Condition],
    config: &DeConfig,
) -> anyhow::Result<Vec<GeneStat>>
where
    T: FloatOpsTS,
{
    config.validate()?;

    if genes.len() != matrix.ncols() {
        return Err(anyhow::anyhow!(
            "Gene list length {} does not match matrix column count {}",
            genes.len(),
            matrix.ncols()
        ));
    }
    if conditions.len() != matrix.nrows() {
        return Err(anyhow::anyhow!(
            "Condition vector length {} does not match matrix row count {}",
            conditions.len(),
            matrix.nrows()
        ));
    }

    let (disease_indices, control_indices) = utils::condition_indices(conditions);
    if disease_indices.is_empty() || control_indices.is_empty() {
        return Err(anyhow::anyhow!(
            "Both disease and control cells are required ({} disease, {} control)",
            disease_indices.len(),
            control_indices.len()
        ));
    }

    let results = matrix.two_group_test(&disease_indices, &control_indices, config.method)?;

    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let adjusted_p_values = correction::adjust(&p_values, config.correction)?;

    let fold_changes = effect::log2_fold_changes(
        matrix,
        &disease_indices,
        &control_indices,
        config.pseudo_count,
    )?;

    Ok(genes
        .iter()
        .zip(results)
        .zip(adjusted_p_values)
        .zip(fold_changes)
        .map(|(((gene, result), p_value_adj), log2_fold_change)| GeneStat {
            gene: gene.clone(),
            log2_fold_change,
            p_value: result.p_value,
            p_value_adj,
            score: result.statistic,
            group: Condition::Disease.label().to_string(),
        })
        .collect())
}
