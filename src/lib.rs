//! # single-signatures
//!
//! A specialized Rust library for disease signature discovery from single-cell data, part of the single-rust ecosystem.
//!
//! This crate identifies gene-expression signatures associated with a disease state across one or
//! more tissues. It computes per-tissue differential-expression statistics between disease and
//! control conditions, filters them for significance, reconciles gene-level results across tissues
//! with directional-consistency rules, and produces ranked cross-tissue and tissue-specific
//! signature sets together with overlap and correlation summaries.
//!
//! ## Core Features
//!
//! - **Differential Expression Analysis**: T-tests and Mann-Whitney U tests with multiple testing
//!   correction, producing per-gene statistics tables
//! - **Signature Filtering**: Significance thresholds on adjusted p-values and log2 fold changes,
//!   with direction annotation
//! - **Cross-Tissue Aggregation**: Genes significant and directionally consistent in a minimum
//!   number of tissues, with aggregated effect sizes
//! - **Tissue Comparison**: Jaccard/intersection/overlap-coefficient signature overlap and
//!   Pearson/Spearman expression correlation between tissues
//! - **Persistence**: CSV signature tables and a nested JSON summary, rewritten idempotently
//!
//! ## Quick Start
//!
//! Run [`pipeline::run`] on a set of per-tissue disease/control expression matrices, or
//! [`pipeline::discover_signatures`] on precomputed differential-expression tables. Both return a
//! [`pipeline::SignatureReport`] that can be persisted with [`export::save_report`].
//!
//! ## Module Organization
//!
//! - **[`testing`]**: Differential-expression testing between disease and control cells
//! - **[`signatures`]**: Significance filtering, cross-tissue aggregation, and summaries
//! - **[`comparison`]**: Pairwise tissue overlap, correlation, and fold-change matrices
//! - **[`pipeline`]**: Multi-tissue orchestration with per-tissue failure isolation
//! - **[`config`]**: Validated configuration value objects
//! - **[`export`]**: Serialization of signature artifacts

pub mod comparison;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod signatures;
pub mod testing;
