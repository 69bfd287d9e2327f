//! Pairwise comparison of tissues: signature overlap, expression correlation, and
//! fold-change matrices.
//!
//! All operations here consume per-tissue tables independently of the cross-tissue
//! aggregation and produce dense, symmetric matrices indexed by tissue name. Degenerate
//! comparisons resolve to documented fallback values instead of errors: overlap metrics fall
//! back to 0 when a union or minimum set size is empty, correlations to NaN when fewer than
//! two paired observations exist or a profile is constant. Downstream consumers (heatmap
//! rendering in particular) are expected to handle NaN entries.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use anyhow::anyhow;
use nalgebra_sparse::CsrMatrix;
use ndarray::Array2;
use single_utilities::traits::FloatOpsTS;

use crate::signatures::TissueTable;

/// Overlap metric between two tissues' signature gene sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMetric {
    /// Intersection size over union size, in `[0, 1]`.
    #[default]
    Jaccard,
    /// Raw intersection size.
    Intersection,
    /// Intersection size over the smaller set size, in `[0, 1]`.
    OverlapCoefficient,
}

impl FromStr for OverlapMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jaccard" => Ok(OverlapMetric::Jaccard),
            "intersection" => Ok(OverlapMetric::Intersection),
            "overlap_coefficient" => Ok(OverlapMetric::OverlapCoefficient),
            other => Err(anyhow!(
                "Unknown overlap metric '{}', expected one of: jaccard, intersection, overlap_coefficient",
                other
            )),
        }
    }
}

/// Correlation method for comparing mean-expression profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
}

impl FromStr for CorrelationMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(anyhow!(
                "Unknown correlation method '{}', expected one of: pearson, spearman",
                other
            )),
        }
    }
}

/// A square matrix of pairwise tissue scores, symmetric by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueMatrix {
    tissues: Vec<String>,
    values: Array2<f64>,
}

impl TissueMatrix {
    fn new(tissues: Vec<String>, values: Array2<f64>) -> Self {
        TissueMatrix { tissues, values }
    }

    pub fn tissues(&self) -> &[String] {
        &self.tissues
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.tissues.is_empty()
    }

    /// Score for a pair of tissues, `None` if either name is unknown.
    pub fn get(&self, t1: &str, t2: &str) -> Option<f64> {
        let i = self.tissues.iter().position(|t| t == t1)?;
        let j = self.tissues.iter().position(|t| t == t2)?;
        Some(self.values[[i, j]])
    }
}

/// Compute the pairwise overlap matrix between tissues' signature gene sets.
///
/// The diagonal equals 1.0 for jaccard and overlap-coefficient on non-empty sets, and the
/// set size for the intersection metric. Comparisons involving empty sets score 0.
pub fn signature_overlap(signatures: &[TissueTable], metric: OverlapMetric) -> TissueMatrix {
    let tissues: Vec<String> = signatures.iter().map(|(t, _)| t.clone()).collect();
    let gene_sets: Vec<HashSet<&str>> = signatures
        .iter()
        .map(|(_, table)| table.iter().map(|g| g.gene.as_str()).collect())
        .collect();

    let n = tissues.len();
    let mut values = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let score = overlap_score(&gene_sets[i], &gene_sets[j], metric);
            values[[i, j]] = score;
            values[[j, i]] = score;
        }
    }

    TissueMatrix::new(tissues, values)
}

fn overlap_score(g1: &HashSet<&str>, g2: &HashSet<&str>, metric: OverlapMetric) -> f64 {
    let intersection = g1.intersection(g2).count();
    match metric {
        OverlapMetric::Jaccard => {
            let union = g1.union(g2).count();
            if union == 0 {
                0.0
            } else {
                intersection as f64 / union as f64
            }
        }
        OverlapMetric::Intersection => intersection as f64,
        OverlapMetric::OverlapCoefficient => {
            let min_size = g1.len().min(g2.len());
            if min_size == 0 {
                0.0
            } else {
                intersection as f64 / min_size as f64
            }
        }
    }
}

/// Mean expression per gene for one tissue, the input to [`expression_correlation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionProfile {
    genes: Vec<String>,
    means: Vec<f64>,
    index: HashMap<String, usize>,
}

impl ExpressionProfile {
    /// Build a profile from parallel gene and mean vectors.
    pub fn new(genes: Vec<String>, means: Vec<f64>) -> anyhow::Result<Self> {
        if genes.len() != means.len() {
            return Err(anyhow!(
                "Expression profile has {} genes but {} mean values",
                genes.len(),
                means.len()
            ));
        }
        let mut index = HashMap::with_capacity(genes.len());
        for (i, gene) in genes.iter().enumerate() {
            if index.insert(gene.clone(), i).is_some() {
                return Err(anyhow!("Duplicate gene identifier in expression profile: {}", gene));
            }
        }
        Ok(ExpressionProfile { genes, means, index })
    }

    /// Column means of a cells × genes expression matrix.
    ///
    /// Absent sparse entries count as zero expression, so each mean is the column sum over
    /// the number of cells.
    pub fn from_matrix<T>(matrix: &CsrMatrix<T>, genes: &[String]) -> anyhow::Result<Self>
    where
        T: FloatOpsTS,
    {
        if genes.len() != matrix.ncols() {
            return Err(anyhow!(
                "Gene list length {} does not match matrix column count {}",
                genes.len(),
                matrix.ncols()
            ));
        }
        let n_cells = matrix.nrows();
        if n_cells == 0 {
            return Err(anyhow!("Expression matrix has no cells"));
        }

        let mut sums = vec![0.0; matrix.ncols()];
        for (_, col, value) in matrix.triplet_iter() {
            sums[col] += value.to_f64().unwrap_or(0.0);
        }
        let means = sums.into_iter().map(|s| s / n_cells as f64).collect();
        ExpressionProfile::new(genes.to_vec(), means)
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn mean(&self, gene: &str) -> Option<f64> {
        self.index.get(gene).map(|&i| self.means[i])
    }
}

/// Correlate mean-expression profiles between every pair of tissues.
///
/// When `genes` is `None` the intersection of all tissues' gene universes is used, ordered by
/// the first profile. Genes absent from either tissue of a pair are excluded from that
/// pairwise computation rather than zero-filled. Pairs with fewer than two shared
/// observations, or with a constant profile, yield NaN.
pub fn expression_correlation(
    profiles: &[(String, ExpressionProfile)],
    genes: Option<&[String]>,
    method: CorrelationMethod,
) -> TissueMatrix {
    let tissues: Vec<String> = profiles.iter().map(|(t, _)| t.clone()).collect();

    let selected: Vec<String> = match genes {
        Some(list) => list.to_vec(),
        None => common_genes(profiles),
    };

    let n = tissues.len();
    let mut values = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for gene in &selected {
                if let (Some(x), Some(y)) = (profiles[i].1.mean(gene), profiles[j].1.mean(gene)) {
                    xs.push(x);
                    ys.push(y);
                }
            }
            let score = match method {
                CorrelationMethod::Pearson => pearson(&xs, &ys),
                CorrelationMethod::Spearman => spearman(&xs, &ys),
            };
            values[[i, j]] = score;
            values[[j, i]] = score;
        }
    }

    TissueMatrix::new(tissues, values)
}

/// Intersection of all profiles' gene universes, in first-profile order.
fn common_genes(profiles: &[(String, ExpressionProfile)]) -> Vec<String> {
    let Some((_, first)) = profiles.first() else {
        return Vec::new();
    };
    first
        .genes()
        .iter()
        .filter(|gene| profiles[1..].iter().all(|(_, p)| p.mean(gene).is_some()))
        .cloned()
        .collect()
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 {
        return f64::NAN;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    cov / denom
}

fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Ranks starting at 1, ties receiving the average of their positions.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}

/// Log2 fold changes for a gene list across tissues (rows genes, columns tissues), NaN where
/// a gene is absent from a tissue's table.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldChangeMatrix {
    genes: Vec<String>,
    tissues: Vec<String>,
    values: Array2<f64>,
}

impl FoldChangeMatrix {
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn tissues(&self) -> &[String] {
        &self.tissues
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn get(&self, gene: &str, tissue: &str) -> Option<f64> {
        let i = self.genes.iter().position(|g| g == gene)?;
        let j = self.tissues.iter().position(|t| t == tissue)?;
        Some(self.values[[i, j]])
    }
}

/// Collect per-tissue log2 fold changes for the requested genes.
pub fn fold_change_matrix(tables: &[TissueTable], genes: &[String]) -> FoldChangeMatrix {
    let tissues: Vec<String> = tables.iter().map(|(t, _)| t.clone()).collect();
    let lookups: Vec<HashMap<&str, f64>> = tables
        .iter()
        .map(|(_, table)| {
            let mut lookup = HashMap::with_capacity(table.len());
            for row in table {
                lookup.entry(row.gene.as_str()).or_insert(row.log2_fold_change);
            }
            lookup
        })
        .collect();

    let mut values = Array2::from_elem((genes.len(), tissues.len()), f64::NAN);
    for (i, gene) in genes.iter().enumerate() {
        for (j, lookup) in lookups.iter().enumerate() {
            if let Some(&fc) = lookup.get(gene.as_str()) {
                values[[i, j]] = fc;
            }
        }
    }

    FoldChangeMatrix {
        genes: genes.to_vec(),
        tissues,
        values,
    }
}
