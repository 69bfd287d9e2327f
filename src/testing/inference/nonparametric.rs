use std::cmp::Ordering;

use nalgebra_sparse::CsrMatrix;
use num_traits::Float;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use single_utilities::traits::{FloatOps, FloatOpsTS};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::testing::{Alternative, TestResult};

/// Mann-Whitney U test for every gene, comparing two groups of cells.
///
/// Uses the normal approximation with tie-averaged ranks and continuity correction, matching
/// the large-sample behavior of the usual rank-sum implementations. Genes are tested in
/// parallel.
pub fn mann_whitney_matrix_groups<T>(
    matrix: &CsrMatrix<T>,
    group1_indices: &[usize],
    group2_indices: &[usize],
    alternative: Alternative,
) -> anyhow::Result<Vec<TestResult<f64>>>
where
    T: FloatOpsTS,
{
    if group1_indices.is_empty() || group2_indices.is_empty() {
        return Err(anyhow::anyhow!("Group indices cannot be empty"));
    }

    let n_genes = matrix.ncols();

    let results: Vec<_> = (0..n_genes)
        .into_par_iter()
        .map(|gene| {
            let group1_values = extract_gene_values(matrix, group1_indices, gene);
            let group2_values = extract_gene_values(matrix, group2_indices, gene);
            let result = mann_whitney(&group1_values, &group2_values, alternative);
            TestResult::<f64> {
                statistic: result.statistic.to_f64().unwrap_or(f64::NAN),
                p_value: result.p_value.to_f64().unwrap_or(1.0),
                effect_size: result.effect_size.and_then(|e| e.to_f64()),
            }
        })
        .collect();

    Ok(results)
}

/// Expression of one gene across a group of cells, absent entries reading as zero.
fn extract_gene_values<T>(matrix: &CsrMatrix<T>, indices: &[usize], gene: usize) -> Vec<T>
where
    T: FloatOpsTS,
{
    indices
        .iter()
        .map(|&row| {
            matrix
                .get_entry(row, gene)
                .map(|entry| entry.into_value())
                .unwrap_or_else(T::zero)
        })
        .collect()
}

/// Mann-Whitney U test on two samples.
pub fn mann_whitney<T>(x: &[T], y: &[T], alternative: Alternative) -> TestResult<T>
where
    T: FloatOps,
{
    let nx = x.len();
    let ny = y.len();

    if nx == 0 || ny == 0 {
        return TestResult::new(<T as Float>::nan(), T::one()); // Insufficient data
    }

    // Combine samples and assign group labels (0 for x, 1 for y)
    let mut combined: Vec<(T, usize)> = Vec::with_capacity(nx + ny);
    combined.extend(x.iter().map(|&v| (v, 0)));
    combined.extend(y.iter().map(|&v| (v, 1)));

    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    // Assign ranks, ties averaged
    let mut ranks = vec![T::zero(); nx + ny];
    let mut i = 0;
    while i < combined.len() {
        let val = combined[i].0;
        let mut j = i + 1;
        while j < combined.len() && combined[j].0 == val {
            j += 1;
        }

        let rank = T::from(i + j - 1).unwrap() / T::from(2.0).unwrap() + T::one();
        for k in i..j {
            ranks[k] = rank;
        }
        i = j;
    }

    let mut rank_sum_x = T::zero();
    for (idx, entry) in combined.iter().enumerate() {
        if entry.1 == 0 {
            rank_sum_x += ranks[idx];
        }
    }

    let u_x = rank_sum_x - T::from(nx * (nx + 1)).unwrap() / T::from(2.0).unwrap();
    let u_y = T::from(nx * ny).unwrap() - u_x;

    let u = match alternative {
        Alternative::TwoSided => Float::min(u_x, u_y),
        Alternative::Less => u_x,
        Alternative::Greater => u_y,
    };

    let mean_u = T::from(nx * ny).unwrap() / T::from(2.0).unwrap();
    let var_u = T::from(nx * ny * (nx + ny + 1)).unwrap() / T::from(12.0).unwrap();
    let correction = T::from(0.5).unwrap();

    let z = match alternative {
        Alternative::TwoSided => {
            let z_score = (Float::max(u_x, u_y) - mean_u - correction) / var_u.sqrt();
            Float::abs(z_score)
        }
        Alternative::Less => (u_x - mean_u + correction) / var_u.sqrt(),
        Alternative::Greater => (u_y - mean_u + correction) / var_u.sqrt(),
    };

    let normal = Normal::new(0.0, 1.0).unwrap();
    let z_f64 = z.to_f64().unwrap_or(0.0);

    let p_value = match alternative {
        Alternative::TwoSided => 2.0 * (1.0 - normal.cdf(z_f64)),
        _ => 1.0 - normal.cdf(z_f64),
    };
    let p_value = T::from(p_value.clamp(0.0, 1.0)).unwrap();

    let effect_size = z / T::from(nx + ny).unwrap().sqrt();

    TestResult::with_effect_size(u, p_value, effect_size)
}
