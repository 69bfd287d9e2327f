use std::collections::BTreeMap;

use serde::Serialize;

use crate::signatures::{CrossTissueSignature, Direction, TissueTable};

/// Counts and top genes for one signature category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub total_genes: usize,
    pub upregulated: usize,
    pub downregulated: usize,
    pub top_genes: Vec<String>,
}

/// Structured summary of a signature discovery run, serializable as nested JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureSummary {
    pub cross_tissue: CategorySummary,
    pub tissue_specific: BTreeMap<String, CategorySummary>,
}

/// Summarize discovered signatures: per-direction counts and the `top_n` genes by
/// significance for the cross-tissue set and for each tissue-specific set.
///
/// Both inputs are expected in their canonical order (cross-tissue rows sorted by tissue
/// count and significance, per-tissue rows by ascending adjusted p-value), so the top genes
/// are simply the leading rows.
pub fn summarize(
    cross_tissue: &[CrossTissueSignature],
    tissue_specific: &[TissueTable],
    top_n: usize,
) -> SignatureSummary {
    let cross = CategorySummary {
        total_genes: cross_tissue.len(),
        upregulated: cross_tissue
            .iter()
            .filter(|s| s.direction == Direction::Up)
            .count(),
        downregulated: cross_tissue
            .iter()
            .filter(|s| s.direction == Direction::Down)
            .count(),
        top_genes: cross_tissue
            .iter()
            .take(top_n)
            .map(|s| s.gene.clone())
            .collect(),
    };

    let mut per_tissue = BTreeMap::new();
    for (tissue, table) in tissue_specific {
        per_tissue.insert(
            tissue.clone(),
            CategorySummary {
                total_genes: table.len(),
                upregulated: table
                    .iter()
                    .filter(|g| g.direction == Direction::Up)
                    .count(),
                downregulated: table
                    .iter()
                    .filter(|g| g.direction == Direction::Down)
                    .count(),
                top_genes: table.iter().take(top_n).map(|g| g.gene.clone()).collect(),
            },
        );
    }

    SignatureSummary {
        cross_tissue: cross,
        tissue_specific: per_tissue,
    }
}
