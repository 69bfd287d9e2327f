use std::cmp::Ordering;

use crate::signatures::{Direction, GeneStat, SignificantGene};

/// Criterion for ranking genes when selecting the top of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    /// Ascending adjusted p-value (most significant first).
    AdjustedPValue,
    /// Descending log2 fold change (strongest upregulation first).
    FoldChange,
}

/// Filter a raw differential-expression table down to significant genes.
///
/// A row is retained when `p_value_adj < max_pval_adj` and
/// `|log2_fold_change| > min_log2fc`; both comparisons are strict, so a fold change of exactly
/// zero never passes even with `min_log2fc == 0`. Retained rows are annotated with their
/// regulation direction and returned ordered by ascending adjusted p-value, ties keeping the
/// input order.
///
/// # Arguments
///
/// * `results` - Raw per-gene statistics for one tissue
/// * `min_log2fc` - Minimum absolute log2 fold change
/// * `max_pval_adj` - Maximum adjusted p-value
pub fn filter_significant(
    results: &[GeneStat],
    min_log2fc: f64,
    max_pval_adj: f64,
) -> Vec<SignificantGene> {
    let mut significant: Vec<SignificantGene> = results
        .iter()
        .filter(|r| r.p_value_adj < max_pval_adj && r.log2_fold_change.abs() > min_log2fc)
        .cloned()
        .map(SignificantGene::from_stat)
        .collect();

    significant.sort_by(|a, b| {
        a.p_value_adj
            .partial_cmp(&b.p_value_adj)
            .unwrap_or(Ordering::Equal)
    });

    significant
}

/// Select the top `n` genes of a significant-gene table.
///
/// With [`RankBy::AdjustedPValue`] rows are ranked by ascending adjusted p-value; with
/// [`RankBy::FoldChange`] by descending log2 fold change. An optional direction restricts the
/// table to up- or downregulated genes before ranking.
pub fn top_genes(
    table: &[SignificantGene],
    n: usize,
    by: RankBy,
    direction: Option<Direction>,
) -> Vec<SignificantGene> {
    let mut rows: Vec<SignificantGene> = table
        .iter()
        .filter(|g| direction.is_none_or(|d| g.direction == d))
        .cloned()
        .collect();

    match by {
        RankBy::AdjustedPValue => rows.sort_by(|a, b| {
            a.p_value_adj
                .partial_cmp(&b.p_value_adj)
                .unwrap_or(Ordering::Equal)
        }),
        RankBy::FoldChange => rows.sort_by(|a, b| {
            b.log2_fold_change
                .partial_cmp(&a.log2_fold_change)
                .unwrap_or(Ordering::Equal)
        }),
    }

    rows.truncate(n);
    rows
}
