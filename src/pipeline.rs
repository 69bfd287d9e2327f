//! Multi-tissue signature discovery orchestration.
//!
//! The pipeline ties the crate together: per-tissue differential expression and significance
//! filtering, cross-tissue aggregation, tissue-specific partitioning, pairwise comparison, and
//! summarization. Tissues are processed independently and combined only through read-only
//! aggregation, so a failure in one tissue is logged and that tissue skipped; the run aborts
//! only when no tissue succeeds. All steps are pure; persistence is left to
//! [`crate::export`].

use anyhow::{Result, anyhow};
use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::FloatOpsTS;

use crate::comparison::{
    ExpressionProfile, FoldChangeMatrix, TissueMatrix, expression_correlation,
    fold_change_matrix, signature_overlap,
};
use crate::config::{DeConfig, SignatureConfig};
use crate::signatures::{
    CrossTissueSignature, GeneStat, SignatureSummary, SignificantGene, TissueTable, aggregate,
    cross_tissue_gene_set, filter_significant, partition, summarize,
};
use crate::testing::{self, utils::combine_conditions};

/// Disease and control expression data for one tissue, already quality-controlled upstream.
///
/// Both matrices are cells × genes over the same `genes` axis.
#[derive(Debug, Clone)]
pub struct TissueDataset<T> {
    pub name: String,
    pub genes: Vec<String>,
    pub disease: CsrMatrix<T>,
    pub control: CsrMatrix<T>,
}

/// Everything a signature discovery run produces.
#[derive(Debug, Clone)]
pub struct SignatureReport {
    /// Genes significant in at least the configured number of tissues, ranked.
    pub cross_tissue: Vec<CrossTissueSignature>,
    /// Per-tissue significant genes not captured cross-tissue, in input tissue order.
    pub tissue_specific: Vec<TissueTable>,
    /// Pairwise signature overlap between the surviving tissues.
    pub overlap: TissueMatrix,
    /// Pairwise mean-expression correlation; only available when the pipeline saw
    /// expression matrices rather than precomputed tables.
    pub correlation: Option<TissueMatrix>,
    /// Log2 fold changes of the cross-tissue genes across tissues.
    pub fold_changes: FoldChangeMatrix,
    /// Nested counts and top genes per category.
    pub summary: SignatureSummary,
}

/// Discover signatures from precomputed per-tissue differential-expression tables.
///
/// Tables are processed in the given order, which also fixes every first-seen tie-break
/// downstream. A tissue with an empty raw table is a shape error for that tissue: it is
/// logged and skipped. Zero significant genes after filtering is a normal, empty result and
/// keeps the tissue in the run.
///
/// # Errors
///
/// Fails fast on an invalid configuration, and when no tissue yields a usable table.
pub fn discover_signatures(
    tissue_tables: &[(String, Vec<GeneStat>)],
    config: &SignatureConfig,
) -> Result<SignatureReport> {
    config.validate()?;

    let mut filtered: Vec<TissueTable> = Vec::with_capacity(tissue_tables.len());
    for (tissue, table) in tissue_tables {
        if table.is_empty() {
            log::warn!("Skipping tissue {tissue}: empty differential-expression table");
            continue;
        }
        let significant =
            filter_significant(table, config.min_log2fc, config.adj_pval_threshold);
        log::info!(
            "{tissue}: {} of {} genes significant",
            significant.len(),
            table.len()
        );
        filtered.push((tissue.clone(), significant));
    }

    if filtered.is_empty() {
        return Err(anyhow!("No tissue produced a usable differential-expression table"));
    }

    Ok(build_report(filtered, None, config))
}

/// Run the full pipeline from per-tissue disease/control expression matrices.
///
/// For each tissue the disease and control datasets are combined, tested for differential
/// expression, and filtered. Tissues failing differential expression (shape mismatches,
/// missing conditions, no genes) are logged and skipped; the run aborts only if every tissue
/// fails. The report additionally carries the pairwise correlation of the tissues'
/// disease-state mean-expression profiles.
pub fn run<T>(
    datasets: &[TissueDataset<T>],
    de_config: &DeConfig,
    config: &SignatureConfig,
) -> Result<SignatureReport>
where
    T: FloatOpsTS + 'static,
{
    de_config.validate()?;
    config.validate()?;

    let mut filtered: Vec<TissueTable> = Vec::with_capacity(datasets.len());
    let mut profiles: Vec<(String, ExpressionProfile)> = Vec::with_capacity(datasets.len());

    for dataset in datasets {
        match analyze_tissue(dataset, de_config, config) {
            Ok((table, profile)) => {
                log::info!("{}: {} significant genes", dataset.name, table.len());
                filtered.push((dataset.name.clone(), table));
                profiles.push((dataset.name.clone(), profile));
            }
            Err(err) => {
                log::warn!("Skipping tissue {}: {err:#}", dataset.name);
            }
        }
    }

    if filtered.is_empty() {
        return Err(anyhow!("Differential expression failed for every tissue"));
    }

    let correlation = expression_correlation(&profiles, None, config.correlation_method);
    Ok(build_report(filtered, Some(correlation), config))
}

fn analyze_tissue<T>(
    dataset: &TissueDataset<T>,
    de_config: &DeConfig,
    config: &SignatureConfig,
) -> Result<(Vec<SignificantGene>, ExpressionProfile)>
where
    T: FloatOpsTS + 'static,
{
    let (combined, conditions) = combine_conditions(&dataset.disease, &dataset.control)?;
    let stats = testing::rank_genes(&combined, &dataset.genes, &conditions, de_config)?;
    let significant =
        filter_significant(&stats, config.min_log2fc, config.adj_pval_threshold);
    let profile = ExpressionProfile::from_matrix(&dataset.disease, &dataset.genes)?;
    Ok((significant, profile))
}

fn build_report(
    filtered: Vec<TissueTable>,
    correlation: Option<TissueMatrix>,
    config: &SignatureConfig,
) -> SignatureReport {
    let cross_tissue = aggregate(&filtered, config.min_tissues, config.direction_consistent);
    let cross_genes = cross_tissue_gene_set(&cross_tissue);
    let tissue_specific = partition(&filtered, &cross_genes);
    let overlap = signature_overlap(&filtered, config.overlap_metric);

    let shared_genes: Vec<String> = cross_tissue.iter().map(|s| s.gene.clone()).collect();
    let fold_changes = fold_change_matrix(&filtered, &shared_genes);

    let summary = summarize(&cross_tissue, &tissue_specific, config.top_n);

    log::info!(
        "Discovered {} cross-tissue signatures across {} tissues",
        cross_tissue.len(),
        filtered.len()
    );

    SignatureReport {
        cross_tissue,
        tissue_specific,
        overlap,
        correlation,
        fold_changes,
        summary,
    }
}
