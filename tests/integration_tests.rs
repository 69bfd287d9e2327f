// End-to-end tests: from raw disease/control expression matrices through differential
// expression, signature discovery, and persistence.

#[cfg(test)]
mod integration_tests {
    use nalgebra_sparse::{CooMatrix, CsrMatrix};
    use single_signatures::config::{DeConfig, SignatureConfig};
    use single_signatures::export::save_report;
    use single_signatures::pipeline::{run, TissueDataset};
    use single_signatures::signatures::Direction;
    use single_signatures::testing::{TTestType, TestMethod};

    /// Dense cells × genes matrix from per-gene column values.
    fn matrix(columns: &[&[f64]]) -> CsrMatrix<f64> {
        let n_cells = columns[0].len();
        let mut coo = CooMatrix::new(n_cells, columns.len());
        for (col, values) in columns.iter().enumerate() {
            for (row, &value) in values.iter().enumerate() {
                coo.push(row, col, value);
            }
        }
        CsrMatrix::from(&coo)
    }

    fn gene_names() -> Vec<String> {
        vec![
            "sharedUp".to_string(),
            "bloodOnly".to_string(),
            "flat".to_string(),
        ]
    }

    /// sharedUp is elevated in disease in both tissues, bloodOnly in blood alone, flat nowhere.
    fn datasets() -> Vec<TissueDataset<f64>> {
        let blood_disease = matrix(&[
            &[8.0, 7.5, 8.5, 8.2, 7.8],
            &[6.0, 6.2, 5.8, 6.1, 5.9],
            &[5.0, 5.1, 4.9, 5.0, 5.0],
        ]);
        let blood_control = matrix(&[
            &[2.0, 2.2, 1.8, 2.1, 1.9],
            &[1.0, 1.1, 0.9, 1.0, 1.0],
            &[5.1, 4.9, 5.0, 5.0, 5.1],
        ]);
        let lung_disease = matrix(&[
            &[4.0, 4.4, 3.6, 4.1, 3.9],
            &[5.0, 5.1, 4.9, 5.0, 5.0],
            &[3.0, 3.1, 2.9, 3.0, 3.0],
        ]);
        let lung_control = matrix(&[
            &[1.0, 1.1, 0.9, 1.0, 1.0],
            &[5.1, 4.9, 5.0, 5.0, 5.1],
            &[3.1, 2.9, 3.0, 3.0, 3.1],
        ]);

        vec![
            TissueDataset {
                name: "blood".to_string(),
                genes: gene_names(),
                disease: blood_disease,
                control: blood_control,
            },
            TissueDataset {
                name: "lung".to_string(),
                genes: gene_names(),
                disease: lung_disease,
                control: lung_control,
            },
        ]
    }

    fn de_config() -> DeConfig {
        DeConfig {
            method: TestMethod::TTest(TTestType::Welch),
            ..DeConfig::default()
        }
    }

    #[test]
    fn full_pipeline_discovers_the_shared_signature() {
        let report = run(&datasets(), &de_config(), &SignatureConfig::default()).unwrap();

        assert_eq!(report.cross_tissue.len(), 1);
        let shared = &report.cross_tissue[0];
        assert_eq!(shared.gene, "sharedUp");
        assert_eq!(shared.n_tissues, 2);
        assert_eq!(shared.direction, Direction::Up);
        assert!(shared.avg_log2fc > 1.5, "log2(8/2) and log2(4/1) average near 2");

        let blood: Vec<&str> = report.tissue_specific[0]
            .1
            .iter()
            .map(|g| g.gene.as_str())
            .collect();
        assert_eq!(blood, vec!["bloodOnly"]);
        assert!(report.tissue_specific[1].1.is_empty());
    }

    #[test]
    fn full_pipeline_reports_overlap_and_correlation() {
        let report = run(&datasets(), &de_config(), &SignatureConfig::default()).unwrap();

        // blood = {sharedUp, bloodOnly}, lung = {sharedUp}.
        let jaccard = report.overlap.get("blood", "lung").unwrap();
        assert!((jaccard - 0.5).abs() < 1e-12);

        let correlation = report.correlation.expect("matrix runs correlate profiles");
        let r = correlation.get("blood", "lung").unwrap();
        assert!((-1.0..=1.0).contains(&r));
        assert!((correlation.get("blood", "blood").unwrap() - 1.0).abs() < 1e-9);

        assert!(report.fold_changes.get("sharedUp", "blood").unwrap() > 1.5);
    }

    #[test]
    fn failing_tissues_are_skipped_and_empty_runs_abort() {
        let mut sets = datasets();
        // Wrong gene axis: this tissue cannot be tested and must be skipped.
        sets.push(TissueDataset {
            name: "corrupt".to_string(),
            genes: vec!["onlyOne".to_string()],
            disease: matrix(&[&[1.0, 2.0], &[1.0, 2.0]]),
            control: matrix(&[&[1.0, 2.0], &[1.0, 2.0]]),
        });

        let report = run(&sets, &de_config(), &SignatureConfig::default()).unwrap();
        let tissues: Vec<&str> = report
            .tissue_specific
            .iter()
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(tissues, vec!["blood", "lung"]);

        // A run where every tissue fails has nothing to aggregate.
        let corrupt_only = vec![TissueDataset {
            name: "corrupt".to_string(),
            genes: vec!["onlyOne".to_string()],
            disease: matrix(&[&[1.0, 2.0], &[1.0, 2.0]]),
            control: matrix(&[&[1.0, 2.0], &[1.0, 2.0]]),
        }];
        assert!(run(&corrupt_only, &de_config(), &SignatureConfig::default()).is_err());
    }

    #[test]
    fn mann_whitney_pipeline_agrees_on_the_strong_signature() {
        let report = run(&datasets(), &DeConfig::default(), &SignatureConfig::default());
        // With only five cells per group the normal-approximation p-values are larger, so
        // just require the shared gene to lead the ranking when anything is significant.
        let report = report.unwrap();
        if let Some(first) = report.cross_tissue.first() {
            assert_eq!(first.gene, "sharedUp");
        }
    }

    #[test]
    fn report_round_trips_through_the_exporter() {
        let report = run(&datasets(), &de_config(), &SignatureConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        save_report(&report, dir.path()).unwrap();
        for file in [
            "cross_tissue_signatures.csv",
            "blood_specific_signatures.csv",
            "lung_specific_signatures.csv",
            "signature_summary.json",
        ] {
            assert!(dir.path().join(file).exists(), "missing artifact {file}");
        }

        // Overwriting the same directory succeeds without cleanup.
        save_report(&report, dir.path()).unwrap();

        let cross =
            std::fs::read_to_string(dir.path().join("cross_tissue_signatures.csv")).unwrap();
        assert!(cross.contains("sharedUp"));
        assert!(cross.contains("blood,lung"));
    }
}
