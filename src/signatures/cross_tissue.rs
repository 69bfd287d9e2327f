use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::signatures::{CrossTissueSignature, SignificantGene, TissueTable};

/// Merge per-tissue significant-gene tables into cross-tissue signatures.
///
/// A gene is admitted when it is significant in at least `min_tissues` of the supplied tables
/// and, if `direction_consistent` is set, regulated in the same direction in every tissue it
/// appears in; directionally conflicting genes are discarded outright. For admitted genes the
/// fold change is averaged over the contributing tissues and the smallest adjusted p-value is
/// kept.
///
/// Tables are scanned in the order given, and genes within a table in row order, so the output
/// is fully determined by the input: rows are sorted by descending `n_tissues`, then ascending
/// `min_p_value_adj`, remaining ties keeping first-encountered gene order. Should a table carry
/// several rows for one gene, the first row wins.
///
/// An empty `tissue_tables` slice yields an empty result.
pub fn aggregate(
    tissue_tables: &[TissueTable],
    min_tissues: usize,
    direction_consistent: bool,
) -> Vec<CrossTissueSignature> {
    // Per-tissue lookups, first row winning for duplicate gene identifiers.
    let lookups: Vec<HashMap<&str, &SignificantGene>> = tissue_tables
        .iter()
        .map(|(_, table)| {
            let mut lookup: HashMap<&str, &SignificantGene> = HashMap::with_capacity(table.len());
            for row in table {
                lookup.entry(row.gene.as_str()).or_insert(row);
            }
            lookup
        })
        .collect();

    // Union of gene identifiers in first-seen order across the ordered tables.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut all_genes: Vec<&str> = Vec::new();
    for (_, table) in tissue_tables {
        for row in table {
            if seen.insert(row.gene.as_str()) {
                all_genes.push(row.gene.as_str());
            }
        }
    }

    let mut signatures: Vec<CrossTissueSignature> = Vec::new();

    for gene in all_genes {
        let mut tissues: Vec<String> = Vec::new();
        let mut fold_changes: Vec<f64> = Vec::new();
        let mut directions = Vec::new();
        let mut min_p_value_adj = f64::INFINITY;

        for ((tissue, _), lookup) in tissue_tables.iter().zip(&lookups) {
            if let Some(row) = lookup.get(gene) {
                tissues.push(tissue.clone());
                fold_changes.push(row.log2_fold_change);
                directions.push(row.direction);
                min_p_value_adj = min_p_value_adj.min(row.p_value_adj);
            }
        }

        if tissues.len() < min_tissues {
            continue;
        }
        if direction_consistent && directions.iter().any(|d| *d != directions[0]) {
            continue;
        }

        let avg_log2fc = fold_changes.iter().sum::<f64>() / fold_changes.len() as f64;
        signatures.push(CrossTissueSignature {
            gene: gene.to_string(),
            n_tissues: tissues.len(),
            tissues,
            avg_log2fc,
            direction: directions[0],
            min_p_value_adj,
        });
    }

    signatures.sort_by(|a, b| {
        b.n_tissues.cmp(&a.n_tissues).then(
            a.min_p_value_adj
                .partial_cmp(&b.min_p_value_adj)
                .unwrap_or(Ordering::Equal),
        )
    });

    signatures
}

/// The set of gene identifiers covered by cross-tissue signatures.
pub fn cross_tissue_gene_set(signatures: &[CrossTissueSignature]) -> HashSet<String> {
    signatures.iter().map(|s| s.gene.clone()).collect()
}

/// Remove cross-tissue genes from each tissue's significant table.
///
/// For every tissue this keeps the rows whose gene is not in `cross_tissue_genes`, preserving
/// row order. Together with the cross-tissue rows this partitions each tissue's significant
/// set: no gene is double-counted and every significant gene is classified.
pub fn partition(
    tissue_tables: &[TissueTable],
    cross_tissue_genes: &HashSet<String>,
) -> Vec<TissueTable> {
    tissue_tables
        .iter()
        .map(|(tissue, table)| {
            let specific: Vec<SignificantGene> = table
                .iter()
                .filter(|row| !cross_tissue_genes.contains(&row.gene))
                .cloned()
                .collect();
            (tissue.clone(), specific)
        })
        .collect()
}
