//! Configuration value objects for differential expression and signature discovery.
//!
//! Configuration is passed explicitly to the operations that consume it; there is no shared
//! config file or ad-hoc lookup at execution time. All recognized fields are validated when a
//! configuration is constructed through [`SignatureConfig::new`] / [`DeConfig::new`], and
//! re-validated at pipeline entry, so malformed settings fail the run immediately.

use anyhow::{anyhow, Result};

use crate::comparison::{CorrelationMethod, OverlapMetric};
use crate::testing::correction::CorrectionMethod;
use crate::testing::TestMethod;

/// Settings for the differential-expression test on one tissue.
#[derive(Debug, Clone, Copy)]
pub struct DeConfig {
    /// Statistical test comparing disease against control cells.
    pub method: TestMethod,
    /// Multiple-testing correction applied to the per-gene p-values.
    pub correction: CorrectionMethod,
    /// Pseudo-count added to group means before the log2 ratio.
    pub pseudo_count: f64,
}

impl Default for DeConfig {
    fn default() -> Self {
        DeConfig {
            method: TestMethod::MannWhitney,
            correction: CorrectionMethod::BenjaminiHochberg,
            pseudo_count: 1e-9,
        }
    }
}

impl DeConfig {
    pub fn new(method: TestMethod, correction: CorrectionMethod, pseudo_count: f64) -> Result<Self> {
        let config = DeConfig {
            method,
            correction,
            pseudo_count,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pseudo_count.is_finite() || self.pseudo_count < 0.0 {
            return Err(anyhow!(
                "pseudo_count must be finite and non-negative, got {}",
                self.pseudo_count
            ));
        }
        Ok(())
    }
}

/// Settings for signature filtering, aggregation, and comparison.
#[derive(Debug, Clone)]
pub struct SignatureConfig {
    /// Minimum absolute log2 fold change for a gene to count as significant.
    pub min_log2fc: f64,
    /// Maximum adjusted p-value for a gene to count as significant.
    pub adj_pval_threshold: f64,
    /// Minimum number of tissues a cross-tissue signature must appear in.
    pub min_tissues: usize,
    /// Require the same regulation direction in every contributing tissue.
    pub direction_consistent: bool,
    /// Metric for the pairwise signature-overlap matrix.
    pub overlap_metric: OverlapMetric,
    /// Method for the pairwise expression-correlation matrix.
    pub correlation_method: CorrelationMethod,
    /// Number of top genes reported per category in the summary.
    pub top_n: usize,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        SignatureConfig {
            min_log2fc: 0.5,
            adj_pval_threshold: 0.05,
            min_tissues: 2,
            direction_consistent: true,
            overlap_metric: OverlapMetric::Jaccard,
            correlation_method: CorrelationMethod::Pearson,
            top_n: 20,
        }
    }
}

impl SignatureConfig {
    /// Create a configuration with the given significance thresholds and defaults for the
    /// remaining fields, validating immediately.
    pub fn new(min_log2fc: f64, adj_pval_threshold: f64) -> Result<Self> {
        let config = SignatureConfig {
            min_log2fc,
            adj_pval_threshold,
            ..SignatureConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_min_tissues(mut self, min_tissues: usize) -> Self {
        self.min_tissues = min_tissues;
        self
    }

    pub fn with_direction_consistent(mut self, direction_consistent: bool) -> Self {
        self.direction_consistent = direction_consistent;
        self
    }

    pub fn with_overlap_metric(mut self, metric: OverlapMetric) -> Self {
        self.overlap_metric = metric;
        self
    }

    pub fn with_correlation_method(mut self, method: CorrelationMethod) -> Self {
        self.correlation_method = method;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_log2fc.is_finite() || self.min_log2fc < 0.0 {
            return Err(anyhow!(
                "min_log2fc must be finite and non-negative, got {}",
                self.min_log2fc
            ));
        }
        if !self.adj_pval_threshold.is_finite()
            || self.adj_pval_threshold <= 0.0
            || self.adj_pval_threshold > 1.0
        {
            return Err(anyhow!(
                "adj_pval_threshold must be in (0, 1], got {}",
                self.adj_pval_threshold
            ));
        }
        if self.min_tissues < 1 {
            return Err(anyhow!("min_tissues must be at least 1"));
        }
        if self.top_n < 1 {
            return Err(anyhow!("top_n must be at least 1"));
        }
        Ok(())
    }
}
