//! Persistence of signature artifacts.
//!
//! One run writes three kinds of files under a caller-specified output directory:
//!
//! - `cross_tissue_signatures.csv` — the cross-tissue signature table, with the `tissues`
//!   field flattened to a comma-joined string
//! - `<tissue>_specific_signatures.csv` — one table per tissue
//! - `signature_summary.json` — the nested counts/top-genes summary
//!
//! Writing is idempotent: every file is recreated on each run (headers only when a table is
//! empty), so re-running fully supersedes a previous run at the same path without prior
//! cleanup.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::SignatureReport;
use crate::signatures::{
    CrossTissueSignature, Direction, SignatureSummary, SignificantGene, TissueTable,
};

/// A cross-tissue signature row flattened for tabular serialization.
#[derive(Debug, Serialize)]
struct CrossTissueRow<'a> {
    gene: &'a str,
    n_tissues: usize,
    tissues: String,
    avg_log2fc: f64,
    direction: Direction,
    min_p_value_adj: f64,
}

impl<'a> From<&'a CrossTissueSignature> for CrossTissueRow<'a> {
    fn from(sig: &'a CrossTissueSignature) -> Self {
        CrossTissueRow {
            gene: &sig.gene,
            n_tissues: sig.n_tissues,
            tissues: sig.tissues.join(","),
            avg_log2fc: sig.avg_log2fc,
            direction: sig.direction,
            min_p_value_adj: sig.min_p_value_adj,
        }
    }
}

/// Persist all signature artifacts of a run.
pub fn save_signatures(
    cross_tissue: &[CrossTissueSignature],
    tissue_specific: &[TissueTable],
    summary: &SignatureSummary,
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    write_cross_tissue_table(cross_tissue, &output_dir.join("cross_tissue_signatures.csv"))?;

    for (tissue, table) in tissue_specific {
        let path = output_dir.join(format!("{tissue}_specific_signatures.csv"));
        write_tissue_table(table, &path)?;
    }

    write_summary(summary, &output_dir.join("signature_summary.json"))?;

    log::info!(
        "Saved signatures for {} tissues to {}",
        tissue_specific.len(),
        output_dir.display()
    );
    Ok(())
}

/// Persist a full [`SignatureReport`].
pub fn save_report(report: &SignatureReport, output_dir: &Path) -> Result<()> {
    save_signatures(
        &report.cross_tissue,
        &report.tissue_specific,
        &report.summary,
        output_dir,
    )
}

fn write_cross_tissue_table(signatures: &[CrossTissueSignature], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for signature in signatures {
        writer.serialize(CrossTissueRow::from(signature))?;
    }
    // An empty table still needs its header row for the file to be self-describing.
    if signatures.is_empty() {
        writer.write_record([
            "gene",
            "n_tissues",
            "tissues",
            "avg_log2fc",
            "direction",
            "min_p_value_adj",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_tissue_table(table: &[SignificantGene], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in table {
        writer.serialize(row)?;
    }
    if table.is_empty() {
        writer.write_record([
            "gene",
            "log2_fold_change",
            "p_value",
            "p_value_adj",
            "score",
            "group",
            "direction",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_summary(summary: &SignatureSummary, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("Failed to serialize summary to {}", path.display()))?;
    Ok(())
}
