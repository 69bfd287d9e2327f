//! Disease signature data model, significance filtering, and cross-tissue aggregation.
//!
//! The types in this module follow the lifecycle of a gene through signature discovery:
//!
//! - [`GeneStat`]: one row of a raw per-tissue differential-expression table
//! - [`SignificantGene`]: a row that survived significance filtering, annotated with a
//!   regulation [`Direction`]
//! - [`CrossTissueSignature`]: a gene significant and (optionally) directionally consistent
//!   in at least a configured number of tissues
//!
//! All entities are ephemeral: they are recomputed per run from the current inputs and
//! configuration, never mutated in place.

use std::fmt;

use serde::{Deserialize, Serialize};

mod cross_tissue;
mod filter;
mod summary;

pub use cross_tissue::{aggregate, cross_tissue_gene_set, partition};
pub use filter::{filter_significant, top_genes, RankBy};
pub use summary::{summarize, CategorySummary, SignatureSummary};

/// Regulation direction of a gene in disease relative to control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction implied by a log2 fold change. A fold change of exactly zero maps to `Down`.
    pub fn from_log2fc(log2_fold_change: f64) -> Self {
        if log2_fold_change > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One row of a raw differential-expression table for a single tissue.
///
/// Produced by [`crate::testing::rank_genes`] or an equivalent upstream test; immutable once
/// produced. `group` names the comparison group the statistics refer to (the disease condition
/// for two-condition runs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneStat {
    pub gene: String,
    pub log2_fold_change: f64,
    pub p_value: f64,
    pub p_value_adj: f64,
    pub score: f64,
    pub group: String,
}

/// A gene that passed significance filtering for one tissue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantGene {
    pub gene: String,
    pub log2_fold_change: f64,
    pub p_value: f64,
    pub p_value_adj: f64,
    pub score: f64,
    pub group: String,
    pub direction: Direction,
}

impl SignificantGene {
    /// Annotate a raw statistics row with its regulation direction.
    pub fn from_stat(stat: GeneStat) -> Self {
        let direction = Direction::from_log2fc(stat.log2_fold_change);
        SignificantGene {
            gene: stat.gene,
            log2_fold_change: stat.log2_fold_change,
            p_value: stat.p_value,
            p_value_adj: stat.p_value_adj,
            score: stat.score,
            group: stat.group,
            direction,
        }
    }
}

/// A gene significant in at least `min_tissues` tissues, with aggregated statistics.
///
/// Derived wholesale from per-tissue tables by [`aggregate`]; a gene appears in at most one
/// signature row. `tissues` lists the contributing tissues in the caller-supplied tissue order
/// and `n_tissues == tissues.len()` always holds. When directional consistency is not enforced,
/// `direction` is the direction observed in the first contributing tissue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTissueSignature {
    pub gene: String,
    pub n_tissues: usize,
    pub tissues: Vec<String>,
    pub avg_log2fc: f64,
    pub direction: Direction,
    pub min_p_value_adj: f64,
}

/// One tissue's significant-gene table, keyed by tissue name.
///
/// Multi-tissue operations take an ordered slice of these pairs rather than a map, so that
/// first-seen tie-breaks are explicit and reproducible.
pub type TissueTable = (String, Vec<SignificantGene>);
