use single_signatures::config::SignatureConfig;
use single_signatures::pipeline::discover_signatures;
use single_signatures::signatures::{Direction, GeneStat};

#[cfg(test)]
mod discovery_scenarios {
    use super::*;
    use approx::assert_relative_eq;

    fn stat(gene: &str, log2fc: f64, padj: f64) -> GeneStat {
        GeneStat {
            gene: gene.to_string(),
            log2_fold_change: log2fc,
            p_value: padj / 2.0,
            p_value_adj: padj,
            score: log2fc * 2.0,
            group: "disease".to_string(),
        }
    }

    #[test]
    fn gene_shared_by_two_tissues_becomes_a_cross_tissue_signature() {
        // blood carries geneA at +2.0 (padj 0.001), lung at +1.5 (padj 0.01).
        let tables = vec![
            ("blood".to_string(), vec![stat("geneA", 2.0, 0.001)]),
            ("lung".to_string(), vec![stat("geneA", 1.5, 0.01)]),
        ];

        let report = discover_signatures(&tables, &SignatureConfig::default()).unwrap();

        println!("cross-tissue signatures: {:?}", report.cross_tissue);
        assert_eq!(report.cross_tissue.len(), 1);

        let sig = &report.cross_tissue[0];
        assert_eq!(sig.gene, "geneA");
        assert_eq!(sig.n_tissues, 2);
        assert_eq!(sig.tissues, vec!["blood", "lung"]);
        assert_relative_eq!(sig.avg_log2fc, 1.75, epsilon = 1e-12);
        assert_eq!(sig.direction, Direction::Up);
        assert_relative_eq!(sig.min_p_value_adj, 0.001, epsilon = 1e-12);
    }

    #[test]
    fn opposite_directions_exclude_a_gene_from_cross_tissue() {
        // Same gene, but lung regulates it the other way.
        let tables = vec![
            ("blood".to_string(), vec![stat("geneA", 2.0, 0.001)]),
            ("lung".to_string(), vec![stat("geneA", -1.5, 0.01)]),
        ];

        let report = discover_signatures(&tables, &SignatureConfig::default()).unwrap();
        assert!(report.cross_tissue.is_empty());

        // Without the consistency requirement the gene comes back.
        let relaxed = SignatureConfig::default().with_direction_consistent(false);
        let report = discover_signatures(&tables, &relaxed).unwrap();
        assert_eq!(report.cross_tissue.len(), 1);
        assert_eq!(report.cross_tissue[0].direction, Direction::Up);
    }

    #[test]
    fn overlap_and_partition_agree_on_shared_genes() {
        // blood = {A, B, C}, lung = {B, C, D}; B and C are shared.
        let tables = vec![
            (
                "blood".to_string(),
                vec![
                    stat("A", 1.0, 0.001),
                    stat("B", 1.0, 0.002),
                    stat("C", 1.0, 0.003),
                ],
            ),
            (
                "lung".to_string(),
                vec![
                    stat("B", 1.0, 0.001),
                    stat("C", 1.0, 0.002),
                    stat("D", 1.0, 0.003),
                ],
            ),
        ];

        let report = discover_signatures(&tables, &SignatureConfig::default()).unwrap();

        let cross_genes: Vec<&str> =
            report.cross_tissue.iter().map(|s| s.gene.as_str()).collect();
        assert_eq!(cross_genes, vec!["B", "C"]);

        // jaccard(blood, lung) = |{B,C}| / |{A,B,C,D}|
        let jaccard = report.overlap.get("blood", "lung").unwrap();
        println!("jaccard(blood, lung) = {jaccard}");
        assert_relative_eq!(jaccard, 0.5, epsilon = 1e-12);

        let blood: Vec<&str> = report.tissue_specific[0]
            .1
            .iter()
            .map(|g| g.gene.as_str())
            .collect();
        let lung: Vec<&str> = report.tissue_specific[1]
            .1
            .iter()
            .map(|g| g.gene.as_str())
            .collect();
        assert_eq!(blood, vec!["A"]);
        assert_eq!(lung, vec!["D"]);
    }

    #[test]
    fn min_tissues_three_excludes_pairwise_genes() {
        let tables = vec![
            ("blood".to_string(), vec![stat("geneA", 2.0, 0.001)]),
            ("lung".to_string(), vec![stat("geneA", 1.5, 0.01)]),
            ("heart".to_string(), vec![stat("geneB", 1.0, 0.01)]),
        ];

        let config = SignatureConfig::default().with_min_tissues(3);
        let report = discover_signatures(&tables, &config).unwrap();
        assert!(report.cross_tissue.is_empty());

        // geneA stays tissue-specific in both tissues that carry it.
        assert_eq!(report.tissue_specific[0].1.len(), 1);
        assert_eq!(report.tissue_specific[1].1.len(), 1);
    }

    #[test]
    fn report_is_reproducible_for_identical_inputs() {
        let tables = vec![
            (
                "blood".to_string(),
                vec![stat("geneA", 2.0, 0.001), stat("geneB", -1.0, 0.01)],
            ),
            (
                "lung".to_string(),
                vec![stat("geneB", -0.8, 0.02), stat("geneA", 1.5, 0.01)],
            ),
        ];
        let config = SignatureConfig::default();

        let first = discover_signatures(&tables, &config).unwrap();
        let second = discover_signatures(&tables, &config).unwrap();

        assert_eq!(first.cross_tissue, second.cross_tissue);
        assert_eq!(first.tissue_specific, second.tissue_specific);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn summary_counts_match_the_tables() {
        let tables = vec![
            (
                "blood".to_string(),
                vec![
                    stat("shared", 2.0, 0.001),
                    stat("bloodUp", 1.0, 0.01),
                    stat("bloodDown", -1.0, 0.02),
                ],
            ),
            ("lung".to_string(), vec![stat("shared", 1.0, 0.005)]),
        ];

        let report = discover_signatures(&tables, &SignatureConfig::default()).unwrap();
        let summary = &report.summary;

        assert_eq!(summary.cross_tissue.total_genes, 1);
        assert_eq!(summary.cross_tissue.upregulated, 1);
        assert_eq!(summary.cross_tissue.downregulated, 0);
        assert_eq!(summary.cross_tissue.top_genes, vec!["shared"]);

        let blood = &summary.tissue_specific["blood"];
        assert_eq!(blood.total_genes, 2);
        assert_eq!(blood.upregulated, 1);
        assert_eq!(blood.downregulated, 1);

        let lung = &summary.tissue_specific["lung"];
        assert_eq!(lung.total_genes, 0);
    }
}
