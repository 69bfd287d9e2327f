use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::FloatOpsTS;

/// Calculate per-gene log2 fold changes between two groups of cells.
///
/// `matrix` is cells × genes; `group1_indices` is the group of interest (disease) and
/// `group2_indices` the reference (control). Means are taken over the full group size, so
/// absent sparse entries count as zero expression. The pseudo-count keeps genes expressed in
/// only one group finite.
///
/// # Arguments
/// * `matrix` - Sparse expression matrix (cells × genes)
/// * `group1_indices` - Row indices of the group of interest
/// * `group2_indices` - Row indices of the reference group
/// * `pseudo_count` - Small value like 1e-9 or 1.0 added to both means
///
/// # Returns
/// * One log2 fold change per gene, in column order.
pub fn log2_fold_changes<T>(
    matrix: &CsrMatrix<T>,
    group1_indices: &[usize],
    group2_indices: &[usize],
    pseudo_count: f64,
) -> anyhow::Result<Vec<f64>>
where
    T: FloatOpsTS,
{
    if group1_indices.is_empty() || group2_indices.is_empty() {
        return Err(anyhow::anyhow!("Group indices cannot be empty"));
    }

    let n_genes = matrix.ncols();
    let sums1 = group_column_sums(matrix, group1_indices, n_genes);
    let sums2 = group_column_sums(matrix, group2_indices, n_genes);

    let n1 = group1_indices.len() as f64;
    let n2 = group2_indices.len() as f64;

    Ok(sums1
        .into_iter()
        .zip(sums2)
        .map(|(sum1, sum2)| {
            let mean1 = sum1 / n1 + pseudo_count;
            let mean2 = sum2 / n2 + pseudo_count;
            (mean1 / mean2).log2()
        })
        .collect())
}

fn group_column_sums<T>(matrix: &CsrMatrix<T>, indices: &[usize], n_genes: usize) -> Vec<f64>
where
    T: FloatOpsTS,
{
    let mut sums = vec![0.0; n_genes];
    for &row in indices {
        let lane = matrix.row(row);
        for (&col, value) in lane.col_indices().iter().zip(lane.values()) {
            sums[col] += value.to_f64().unwrap_or(0.0);
        }
    }
    sums
}
