//! Integration tests for the Monte Carlo CLR pipeline.

use aldex_clr::prelude::*;
use approx::assert_relative_eq;
use std::io::Write;
use tempfile::NamedTempFile;

/// Synthetic counts: 12 features × 8 samples, conditions interleaved ctl/trt.
///
/// - Features 0-3: abundant everywhere
/// - Features 4-7: 4x higher in trt
/// - Features 8-9: present only in ctl samples
/// - Feature 10: present only in trt samples
/// - Feature 11: never observed
fn synthetic_table() -> CountTable {
    let n_features = 12;
    let n_samples = 8;

    let mut rng_seed = 7u64;
    let simple_rand = |seed: &mut u64| -> f64 {
        *seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        ((*seed >> 16) & 0x7FFF) as f64 / 32768.0
    };

    let mut values = Vec::with_capacity(n_features * n_samples);
    for feat in 0..n_features {
        for sample in 0..n_samples {
            let is_treatment = sample % 2 == 1;
            let base = match feat {
                0..=3 => 200.0,
                4..=7 => {
                    if is_treatment {
                        160.0
                    } else {
                        40.0
                    }
                }
                8..=9 => {
                    if is_treatment {
                        0.0
                    } else {
                        30.0
                    }
                }
                10 => {
                    if is_treatment {
                        25.0
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            };
            let noise = 0.8 + 0.4 * simple_rand(&mut rng_seed);
            values.push((base * noise).round());
        }
    }

    let feature_ids: Vec<String> = (0..n_features).map(|i| format!("taxon_{}", i)).collect();
    let sample_ids: Vec<String> = (0..n_samples).map(|i| format!("sample_{}", i)).collect();
    CountTable::from_row_slice(&values, &feature_ids, &sample_ids).unwrap()
}

fn synthetic_conditions() -> ConditionLabels {
    ConditionLabels::new((0..8).map(|i| if i % 2 == 0 { "ctl" } else { "trt" }))
}

fn assert_centered(clr: &ClrMatrix, features: &[usize]) {
    for mean in clr.instance_means(features) {
        assert_relative_eq!(mean, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_small_table_default_denominator() {
    let table = CountTable::from_row_slice(
        &[0.0, 5.0, 10.0, 8.0, 3.0, 0.0],
        &["f1", "f2", "f3"],
        &["s1", "s2"],
    )
    .unwrap();
    let conditions = ConditionLabels::new(["A", "B"]);
    let config = ClrConfig::default().with_seed(42);

    let result = transform(&table, &conditions, &config).unwrap();
    assert_eq!(result.n_features(), 3);
    assert_eq!(result.n_samples(), 2);
    assert_eq!(result.n_mc_samples(), 128);
    assert_eq!(result.n_conditions(), 2);
    assert!(result.is_default_denominator());
    assert!(result.warnings().is_empty());

    for (_, clr) in result.iter() {
        assert_eq!(clr.n_features(), 3);
        assert_eq!(clr.n_instances(), 128);
        assert_centered(clr, &[0, 1, 2]);
    }
    assert_relative_eq!(result.prior_adjusted().get(0, 0), 0.5);
    assert_relative_eq!(result.prior_adjusted().get(1, 0), 10.5);
}

#[test]
fn test_zero_sum_feature_dropped() {
    let table = CountTable::from_row_slice(
        &[4.0, 6.0, 0.0, 0.0, 9.0, 1.0, 2.0, 2.0],
        &["kept_a", "gone", "kept_b", "kept_c"],
        &["s1", "s2"],
    )
    .unwrap();
    let conditions = ConditionLabels::new(["A", "B"]);
    let result = transform(&table, &conditions, &ClrConfig::default().with_seed(1)).unwrap();

    assert_eq!(result.feature_ids(), &["kept_a", "kept_b", "kept_c"]);
    assert_eq!(result.sample_clr("s1").unwrap().feature_ids(), result.feature_ids());
}

#[test]
fn test_low_mc_samples_warns_but_succeeds() {
    let config = ClrConfig::default().with_mc_samples(50).with_seed(2);
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();

    assert_eq!(result.n_mc_samples(), 50);
    assert_eq!(
        result.warnings(),
        &[ConfigWarning::LowMonteCarloSamples {
            requested: 50,
            recommended: 128
        }]
    );
    assert_eq!(result.summary().warnings.len(), 1);
}

#[test]
fn test_negative_count_rejected() {
    let table = CountTable::from_row_slice(
        &[3.0, -1.0, 4.0, 5.0],
        &["f1", "f2"],
        &["s1", "s2"],
    )
    .unwrap();
    let conditions = ConditionLabels::new(["A", "B"]);
    let result = transform(&table, &conditions, &ClrConfig::default());
    assert!(matches!(result, Err(ClrError::InvalidInput(_))));
}

#[test]
fn test_condition_count_mismatch_rejected() {
    let conditions = ConditionLabels::new(["ctl", "trt", "ctl"]);
    let result = transform(&synthetic_table(), &conditions, &ClrConfig::default());
    assert!(matches!(result, Err(ClrError::InvalidInput(_))));
}

#[test]
fn test_fixed_seed_reproducible_serial_and_parallel() {
    let config = ClrConfig::default().with_seed(1234).with_denom(DenominatorMode::Iqlr);
    let table = synthetic_table();
    let conditions = synthetic_conditions();

    let first = transform(&table, &conditions, &config).unwrap();
    let second = transform(&table, &conditions, &config).unwrap();
    let parallel = transform(&table, &conditions, &config.clone().parallel(true)).unwrap();

    for i in 0..first.n_samples() {
        let a = first.sample_clr_at(i).unwrap();
        assert_eq!(a.matrix(), second.sample_clr_at(i).unwrap().matrix());
        assert_eq!(a.matrix(), parallel.sample_clr_at(i).unwrap().matrix());
    }
}

#[test]
fn test_different_seeds_differ() {
    let table = synthetic_table();
    let conditions = synthetic_conditions();
    let a = transform(&table, &conditions, &ClrConfig::default().with_seed(1)).unwrap();
    let b = transform(&table, &conditions, &ClrConfig::default().with_seed(2)).unwrap();
    assert_ne!(
        a.sample_clr_at(0).unwrap().matrix(),
        b.sample_clr_at(0).unwrap().matrix()
    );
}

#[test]
fn test_iqlr_restricted_reference() {
    let config = ClrConfig::default().with_seed(5).with_denom(DenominatorMode::Iqlr);
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();

    let denom = match result.denominator() {
        FeatureSubset::Global(indices) => indices.clone(),
        other => panic!("expected a global set, got {:?}", other),
    };
    assert!(!denom.is_empty());
    assert!(denom.len() < result.n_features());
    assert_eq!(result.branch(), ClrBranch::Restricted);

    let all: Vec<usize> = (0..result.n_features()).collect();
    for (_, clr) in result.iter() {
        assert_centered(clr, &denom);
        assert!(clr.instance_means(&all).iter().any(|m| m.abs() > 1e-6));
    }
}

#[test]
fn test_zero_mode_interleaved_conditions() {
    let config = ClrConfig::default().with_seed(9).with_denom(DenominatorMode::Zero);
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();

    // taxon_11 is dropped, so indices 0..=10 map to taxon_0..taxon_10
    assert_eq!(result.n_features(), 11);
    let ctl = result.denominator().for_condition("ctl").unwrap().to_vec();
    let trt = result.denominator().for_condition("trt").unwrap().to_vec();
    assert_eq!(ctl, (0..=9).collect::<Vec<_>>());
    assert_eq!(trt, vec![0, 1, 2, 3, 4, 5, 6, 7, 10]);
    assert_eq!(result.branch(), ClrBranch::Restricted);

    for (j, (_, clr)) in result.iter().enumerate() {
        let own = if j % 2 == 0 { &ctl } else { &trt };
        assert_centered(clr, own);
    }
}

#[test]
fn test_explicit_denominator() {
    let config = ClrConfig::default()
        .with_seed(11)
        .with_denom("3,0,1".parse().unwrap());
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();

    assert_eq!(result.denominator(), &FeatureSubset::Global(vec![0, 1, 3]));
    for (_, clr) in result.iter() {
        assert_centered(clr, &[0, 1, 3]);
    }

    let out_of_range = ClrConfig::default().with_denom(DenominatorMode::Explicit(vec![11]));
    let err = transform(&synthetic_table(), &synthetic_conditions(), &out_of_range);
    assert!(matches!(err, Err(ClrError::InvalidInput(_))));
}

#[test]
fn test_explicit_all_features_uses_default_branch() {
    let config = ClrConfig::default()
        .with_seed(12)
        .with_denom(DenominatorMode::Explicit((0..11).rev().collect()));
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();
    assert_eq!(result.branch(), ClrBranch::Default);
}

#[test]
fn test_mc_instance_slices_all_samples() {
    let config = ClrConfig::default().with_seed(13).with_mc_samples(16);
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();

    let instance = result.mc_instance(15).unwrap();
    assert_eq!(instance.shape(), (11, 8));
    for j in 0..8 {
        let clr = result.sample_clr_at(j).unwrap();
        assert_eq!(instance.column(j).iter().copied().collect::<Vec<_>>(), clr.instance(15));
    }
    assert!(result.mc_instance(16).is_none());
}

#[test]
fn test_expected_clr_tsv_output() {
    let config = ClrConfig::default().with_seed(21);
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();

    let expected = result.expected_clr();
    assert_eq!(expected.n_features(), 11);
    assert_eq!(expected.n_samples(), 8);
    for j in 0..expected.n_samples() {
        assert_relative_eq!(expected.col(j).iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    let temp_file = NamedTempFile::new().unwrap();
    expected.to_tsv(temp_file.path()).unwrap();
    let contents = std::fs::read_to_string(temp_file.path()).unwrap();
    let mut lines = contents.lines();
    assert!(lines.next().unwrap().starts_with("feature_id\tsample_0\tsample_1"));
    assert_eq!(lines.count(), 11);
}

#[test]
fn test_inputs_from_tsv() {
    let mut counts = NamedTempFile::new().unwrap();
    writeln!(counts, "feature_id\ts1\ts2\ts3\ts4").unwrap();
    writeln!(counts, "otu_a\t12\t0\t7\t30").unwrap();
    writeln!(counts, "otu_b\t100\t85\t120\t95").unwrap();
    writeln!(counts, "otu_c\t0\t0\t0\t0").unwrap();
    writeln!(counts, "otu_d\t3\t9\t1\t4").unwrap();
    counts.flush().unwrap();

    // metadata rows in a different order than the count columns
    let mut metadata = NamedTempFile::new().unwrap();
    writeln!(metadata, "sample_id\tbatch\tgroup").unwrap();
    writeln!(metadata, "s3\tx\tcontrol").unwrap();
    writeln!(metadata, "s1\tx\tcontrol").unwrap();
    writeln!(metadata, "s4\ty\ttreatment").unwrap();
    writeln!(metadata, "s2\ty\ttreatment").unwrap();
    metadata.flush().unwrap();

    let table = CountTable::from_tsv(counts.path()).unwrap();
    let conditions = ConditionLabels::from_tsv(metadata.path(), "group", table.sample_ids()).unwrap();
    assert_eq!(
        conditions.labels(),
        &["control", "treatment", "control", "treatment"]
    );

    let config = ClrConfig::default().with_seed(3).with_denom(DenominatorMode::Zero);
    let result = transform(&table, &conditions, &config).unwrap();
    assert_eq!(result.feature_ids(), &["otu_a", "otu_b", "otu_d"]);
    assert_eq!(
        result.denominator(),
        &FeatureSubset::PerCondition(vec![
            ("control".to_string(), vec![0, 1, 2]),
            ("treatment".to_string(), vec![1, 2]),
        ])
    );
}

#[test]
fn test_config_yaml_drives_run() {
    let config = ClrConfig::from_yaml("mc_samples: 64\ndenom: iqlr\nseed: 8\n").unwrap();
    let from_yaml = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();
    let from_builder = transform(
        &synthetic_table(),
        &synthetic_conditions(),
        &ClrConfig::default()
            .with_mc_samples(64)
            .with_denom(DenominatorMode::Iqlr)
            .with_seed(8),
    )
    .unwrap();

    assert_eq!(from_yaml.n_mc_samples(), 64);
    assert_eq!(from_yaml.mode(), &DenominatorMode::Iqlr);
    assert_eq!(
        from_yaml.sample_clr_at(3).unwrap().matrix(),
        from_builder.sample_clr_at(3).unwrap().matrix()
    );
}

#[test]
fn test_sanitized_counts_are_stable() {
    let conditions = synthetic_conditions();
    let first = sanitize(&synthetic_table(), &conditions, 128).unwrap();
    let second = sanitize(&CountTable::from(&first.counts), &conditions, 128).unwrap();

    assert_eq!(second.zero_sum.n_removed(), 0);
    assert_eq!(first.counts.feature_ids(), second.counts.feature_ids());
    for row in 0..first.counts.n_features() {
        assert_eq!(first.counts.row_dense(row), second.counts.row_dense(row));
    }
}

#[test]
fn test_summary_json() {
    let config = ClrConfig::default().with_seed(4).with_denom(DenominatorMode::Zero);
    let result = transform(&synthetic_table(), &synthetic_conditions(), &config).unwrap();
    let summary = result.summary();

    assert_eq!(summary.n_features, 11);
    assert_eq!(summary.n_samples, 8);
    assert_eq!(summary.mode, "zero");
    let json = serde_json::to_string(&summary).unwrap();
    let back: ClrSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(back.denominator, summary.denominator);
}

#[test]
fn test_dominant_feature_transforms() {
    let table = CountTable::from_row_slice(&[1e15, 1e15, 0.0, 1.0], &["dominant", "rare"], &["s1", "s2"])
        .unwrap();
    let conditions = ConditionLabels::new(["A", "B"]);
    for seed in [1, 2, 3] {
        let result = transform(&table, &conditions, &ClrConfig::default().with_seed(seed)).unwrap();
        for (_, clr) in result.iter() {
            assert!(clr.matrix().iter().all(|v| v.is_finite()));
            assert_centered(clr, &[0, 1]);
        }
    }
}

#[test]
fn test_oversized_counts_rejected() {
    let table = CountTable::from_row_slice(&[1.8e19, 1.8e19, 3.0, 4.0], &["f1", "f2"], &["s1", "s2"])
        .unwrap();
    let conditions = ConditionLabels::new(["A", "B"]);
    let result = transform(&table, &conditions, &ClrConfig::default());
    assert!(matches!(result, Err(ClrError::InvalidInput(_))));
}
