//! End-to-end analysis scenarios
//!
//! Datasets are generated deterministically; every run uses the default
//! engine (seed 42, 100/50 trees) unless stated otherwise.

use virtual_twins::dataset::{Column, Dataset};
use virtual_twins::model::{fit_and_score, TreeParams};
use virtual_twins::prepare::prepare;
use virtual_twins::result::round_score;
use virtual_twins::subgroup::SubgroupOutcome;
use virtual_twins::{analyze, Axiom, Engine, Error};

/// `n` rows: x in 0..n, a wiggly outcome, and one arm label per row
#[allow(clippy::cast_precision_loss)]
fn dataset_with_arms(arms: &[&str]) -> Dataset {
    let n = arms.len();
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let noise: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
    let y: Vec<f64> = x.iter().zip(&noise).map(|(x, e)| 3.0 * x + e).collect();
    Dataset::from_columns(vec![
        Column::numeric("x", x),
        Column::numeric("noise", noise),
        Column::categorical("arm", arms.to_vec()),
        Column::numeric("y", y),
    ])
    .unwrap()
}

fn single_arm(n: usize) -> Dataset {
    dataset_with_arms(&vec!["A"; n])
}

#[test]
fn test_single_trainable_partition() {
    let ds = single_arm(25);
    let result = analyze(&ds, "y", "arm").unwrap();

    assert_eq!(result.partition_count(), 1);
    assert_eq!(result.sample_count(), 25);
    assert_eq!(result.feature_count(), 3);
    assert_eq!(result.trained_partitions(), 1);

    // The aggregate is exactly the single partition's holdout R²
    let prepared = prepare(&ds, "y").unwrap();
    let spec = Engine::default().config().subgroup_policy().fit;
    let expected = fit_and_score(&prepared, &spec).unwrap().holdout_r2;
    assert_eq!(result.aggregate_score(), round_score(expected));
    assert_eq!(result.subgroups()[0].score(), Some(round_score(expected)));
}

#[test]
fn test_single_small_partition_defaults_to_zero() {
    let result = analyze(&single_arm(15), "y", "arm").unwrap();
    assert_eq!(result.partition_count(), 1);
    assert_eq!(result.aggregate_score().to_bits(), 0.0_f64.to_bits());
    assert_eq!(result.trained_partitions(), 0);
    assert_eq!(result.subgroups()[0].outcome, SubgroupOutcome::PreparedOnly);
    assert!(!result.axioms().passed(Axiom::Consistency));
}

#[test]
fn test_partition_count_includes_untrainable_levels() {
    let mut arms = vec!["big"; 30];
    arms.extend(vec!["tiny"; 5]);
    arms.extend(vec!["mid"; 12]);
    let result = analyze(&dataset_with_arms(&arms), "y", "arm").unwrap();

    assert_eq!(result.partition_count(), 3);
    assert_eq!(result.trained_partitions(), 1);
    let outcomes: Vec<&SubgroupOutcome> = result.subgroups().iter().map(|s| &s.outcome).collect();
    assert!(matches!(outcomes[0], SubgroupOutcome::Trained { .. }));
    assert_eq!(outcomes[1], &SubgroupOutcome::Skipped);
    assert_eq!(outcomes[2], &SubgroupOutcome::PreparedOnly);
}

#[test]
fn test_interpretability_boundary() {
    const LEVELS: [&str; 11] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"];

    let ten: Vec<&str> = (0..40).map(|i| LEVELS[i % 10]).collect();
    let result = analyze(&dataset_with_arms(&ten), "y", "arm").unwrap();
    assert_eq!(result.partition_count(), 10);
    assert!(result.axioms().passed(Axiom::Interpretability));

    let eleven: Vec<&str> = (0..44).map(|i| LEVELS[i % 11]).collect();
    let result = analyze(&dataset_with_arms(&eleven), "y", "arm").unwrap();
    assert_eq!(result.partition_count(), 11);
    assert!(!result.axioms().passed(Axiom::Interpretability));
}

#[test]
fn test_repeated_runs_are_identical() {
    let mut arms = vec!["treated"; 24];
    arms.extend(vec!["control"; 26]);
    let ds = dataset_with_arms(&arms);

    let first = analyze(&ds, "y", "arm").unwrap();
    let second = analyze(&ds, "y", "arm").unwrap();
    assert_eq!(first.benchmark_score().to_bits(), second.benchmark_score().to_bits());
    assert_eq!(first.aggregate_score().to_bits(), second.aggregate_score().to_bits());
    assert_eq!(first, second);
}

#[test]
fn test_strong_signal_passes_all_axioms() {
    let mut arms = vec!["treated"; 60];
    arms.extend(vec!["control"; 60]);
    let result = analyze(&dataset_with_arms(&arms), "y", "arm").unwrap();

    assert!(result.benchmark_score() > 0.8, "benchmark {}", result.benchmark_score());
    assert!(result.aggregate_score() > 0.8, "aggregate {}", result.aggregate_score());
    assert!(result.axioms().all_passed());
}

#[test]
fn test_numeric_intervention_column() {
    let arm: Vec<i64> = (0..50).map(|i| i64::from(i % 2 == 0)).collect();
    #[allow(clippy::cast_precision_loss)]
    let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
    let ds = Dataset::from_columns(vec![
        Column::numeric("x", x),
        Column::integer("treated", arm),
        Column::numeric("y", y),
    ])
    .unwrap();

    let result = analyze(&ds, "y", "treated").unwrap();
    assert_eq!(result.partition_count(), 2);
    assert_eq!(result.trained_partitions(), 2);
    let levels: Vec<&str> = result.subgroups().iter().map(|s| s.level.as_str()).collect();
    assert_eq!(levels, vec!["1", "0"]);
}

#[test]
fn test_missing_outcome_column() {
    let err = analyze(&single_arm(25), "response", "arm").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_missing_intervention_column() {
    let err = analyze(&single_arm(25), "y", "dose").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_categorical_outcome_aborts() {
    let err = analyze(&single_arm(25), "arm", "arm").unwrap_err();
    assert!(matches!(err, Error::Training(_)));
}

#[test]
fn test_benchmark_needs_enough_rows() {
    let err = analyze(&single_arm(5), "y", "arm").unwrap_err();
    assert!(matches!(err, Error::Training(_)));
    assert!(err.to_string().contains("Benchmark model"));
}

#[test]
fn test_custom_engine_thresholds() {
    let engine = Engine::builder()
        .benchmark_estimators(10)
        .subgroup_estimators(10)
        .min_partition_rows(4)
        .min_training_rows(9)
        .build()
        .unwrap();
    let result = engine.analyze(&single_arm(15), "y", "arm").unwrap();
    assert_eq!(result.trained_partitions(), 1);
    assert_ne!(result.subgroups()[0].outcome, SubgroupOutcome::PreparedOnly);
}

#[test]
fn test_depth_cap_changes_nothing_structural() {
    let engine = Engine::builder().max_depth(2).build().unwrap();
    let spec_tree = TreeParams {
        max_depth: Some(2),
        ..TreeParams::default()
    };
    assert_eq!(engine.config().benchmark_spec().tree, spec_tree);
    let result = engine.analyze(&single_arm(30), "y", "arm").unwrap();
    assert_eq!(result.partition_count(), 1);
}

#[test]
fn test_result_json_shape() {
    let result = analyze(&single_arm(25), "y", "arm").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["treatment_groups"], 1);
    assert_eq!(json["sample_size"], 25);
    assert_eq!(json["feature_count"], 3);
    assert!(json["axioms"]["Axiom 3: Interpretability"].as_bool().unwrap());
    assert_eq!(json["subgroups"][0]["status"], "trained");
}

#[test]
fn test_csv_end_to_end() {
    let mut csv = String::from("age,site,arm,outcome\n");
    for i in 0..48 {
        let arm = if i % 3 == 0 { "placebo" } else { "drug" };
        let site = ["north", "south"][i % 2];
        csv.push_str(&format!("{},{site},{arm},{}.5\n", 20 + i, i * 2));
    }
    let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
    let result = analyze(&ds, "outcome", "arm").unwrap();
    assert_eq!(result.sample_count(), 48);
    assert_eq!(result.feature_count(), 3);
    assert_eq!(result.partition_count(), 2);
    // placebo: 16 rows (prepared only), drug: 32 rows (trained)
    assert_eq!(result.trained_partitions(), 1);
}
