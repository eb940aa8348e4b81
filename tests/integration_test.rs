// Integration tests for steelmatch
use std::fs;
use std::path::Path;

use steelmatch::pipeline::{load_inventory, load_rfqs, prepare, scenario_output};
use steelmatch::{
    ablation_scenarios, cluster, comparison_scenarios, run_scenarios, ClusterConfig, EngineConfig, FeatureFamily,
    InventoryMatcher, MatcherConfig, RecordId, Settings, SimilarityEngine,
};
use steelmatch_similarity::interval_similarity;
use steelmatch_storage::{read_table, write_clusters, write_matches, ReadOptions};
use tempfile::TempDir;

const RFQS: &str = "\
ID,Grade,Thickness_min,Thickness_max,Width_min,Width_max,Weight_min,Weight_max,Coating,Finish,Form,Surface_type
1,S235JR,2,3,1000,1250,,,Z100,GI,Coil,
2,S235 J0,2.5,3,1000,1250,,,Z100,GI,Coil,
3,S355J2 steel,8,10,1500,2000,5000,8000,,Hot rolled,Sheet,Pickled
4,DX51D,0.5,0.8,,1500,,,Z275,GI,Coil,
5,,6,6,1800,1800,,,,Oiled,Sheet,
";

const REFERENCE: &str = "\
Grade/Material\tCarbon (C)\tManganese (Mn)\tTensile strength (Rm)\tYield strength (Re or Rp0.2)
S235JR\t0.17 %\t1.40 %\t360-510 MPa\t≥235
S235JR\t0.99 %\t9.9 %\t1-2\t1
S355J2\t0.20 %\t1.60 %\t470–630 MPa\t355
DX51D\tmax 0.18\t-\t270-500\t-
";

const INVENTORY: &str = "\
Article_ID,Grade,Thickness_mm,Width_mm,Gross_weight_kg,Finish
A-100,S235JR,2.5,1250,4000,GI
A-101,S355J2,9,1800,7000,Hot rolled
A-102,DX51D,0.6,1500,,GI
A-103,S235J2,3,1000,NaN,oiled
";

fn write_inputs(dir: &Path) {
    fs::write(dir.join("rfq.csv"), RFQS).unwrap();
    fs::write(dir.join("reference_properties.tsv"), REFERENCE).unwrap();
    fs::write(dir.join("inventory.csv"), INVENTORY).unwrap();
}

#[test]
fn test_rank_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let settings = Settings::default();

    let features = prepare(
        &dir.path().join("rfq.csv"),
        Some(&dir.path().join("reference_properties.tsv")),
        &settings,
    )
    .unwrap();
    assert_eq!(features.len(), 5);
    assert_eq!(features.property_columns().len(), 4);

    // first reference row for S235JR wins, alias applies to RFQ 2
    assert_eq!(features.number(0, "Carbon (C)_mid"), Some(0.17));
    assert_eq!(features.number(1, "Carbon (C)_mid"), Some(0.17));
    assert!((features.number(2, "Tensile strength (Rm)_mid").unwrap() - 550.0).abs() < 1e-9);
    // blank grade joins nothing
    assert_eq!(features.number(4, "Carbon (C)_mid"), None);

    let engine = SimilarityEngine::new(EngineConfig::default()).unwrap();
    let matches = engine.rank(&features);
    assert_eq!(matches.len(), 5 * 3);
    assert!(matches.iter().all(|m| m.rfq_id != m.match_id));
    assert_eq!(matches[0].rfq_id, RecordId::Integer(1));
    assert_eq!(matches[0].match_id, RecordId::Integer(2));

    let out = scenario_output(&dir.path().join("outputs"), 3, "similar");
    write_matches(&out, &matches).unwrap();
    let written = read_table(&out, &ReadOptions::default().with_id(steelmatch_storage::IdColumn::RowNumber)).unwrap();
    assert_eq!(written.len(), 15);
    assert_eq!(written.columns(), &["rfq_id", "match_id", "similarity_score"]);
}

#[test]
fn test_ablation_and_comparison() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let settings = Settings::default();
    let features = prepare(
        &dir.path().join("rfq.csv"),
        Some(&dir.path().join("reference_properties.tsv")),
        &settings,
    )
    .unwrap();

    let ablation = run_scenarios(&features, &ablation_scenarios()).unwrap();
    assert_eq!(ablation.len(), 5);
    for outcome in &ablation {
        assert_eq!(outcome.matches.len(), 15);
        let mean = outcome.mean_score.unwrap();
        assert!((-1e-9..=1.0 + 1e-9).contains(&mean), "{}: {}", outcome.name, mean);
        write_matches(&scenario_output(dir.path(), 3, &outcome.name), &outcome.matches).unwrap();
    }
    assert!(dir.path().join("top3_adjusted_weights.csv").exists());

    let comparison = run_scenarios(&features, &comparison_scenarios()).unwrap();
    assert_eq!(comparison[0].name, "baseline");
    assert_eq!(comparison[1].name, "hybrid");
    assert_eq!(comparison[0].matches, ablation[0].matches);
}

#[test]
fn test_grade_only_without_reference_scores_zero() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let features = prepare(&dir.path().join("rfq.csv"), None, &Settings::default()).unwrap();

    let engine = SimilarityEngine::new(EngineConfig::only(FeatureFamily::GradeProperties)).unwrap();
    let matches = engine.rank(&features);
    assert_eq!(matches.len(), 15);
    assert!(matches.iter().all(|m| m.similarity_score == 0.0));
}

#[test]
fn test_inventory_matching_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let settings = Settings::default();

    let rfqs = load_rfqs(&dir.path().join("rfq.csv"), &settings).unwrap();
    let inventory = load_inventory(&dir.path().join("inventory.csv"), &settings).unwrap();
    let matcher = InventoryMatcher::new(MatcherConfig::default(), settings.aliases.clone()).unwrap();

    let scored = matcher.explain(&rfqs, 0, &inventory);
    let best = &scored[0];
    assert_eq!(best.id, RecordId::from("A-100"));

    let thickness = best
        .dimension_scores
        .iter()
        .find(|(name, _)| name == "thickness")
        .map(|(_, s)| *s)
        .unwrap();
    let expected = interval_similarity(settings.matcher.interval_metric, Some(2.0), Some(3.0), Some(2.5), Some(2.5));
    assert_eq!(thickness, expected);
    assert_eq!(best.categorical, 1.0);
    assert!((best.score - (0.6 * best.numeric + 0.4 * best.categorical)).abs() < 1e-12);

    let matches = matcher.rank(&rfqs, &inventory);
    assert_eq!(matches.len(), 5 * 3);
    assert_eq!(matches[0].match_id, RecordId::from("A-100"));
    // S235J2 in stock is an alias of the requested S235JR
    let second_rfq: Vec<_> = matches.iter().filter(|m| m.rfq_id == RecordId::Integer(2)).collect();
    assert!(second_rfq.iter().any(|m| m.match_id == RecordId::from("A-103")));

    let out = dir.path().join("outputs").join("top3.csv");
    write_matches(&out, &matches).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("rfq_id,match_id,similarity_score\n1,A-100,"));
}

#[test]
fn test_clustering_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let settings = Settings::default();
    let features = prepare(
        &dir.path().join("rfq.csv"),
        Some(&dir.path().join("reference_properties.tsv")),
        &settings,
    )
    .unwrap();

    let config = ClusterConfig::default();
    let first = cluster(&features, &config).unwrap();
    let second = cluster(&features, &config).unwrap();
    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.assignments.len(), 5);
    assert!(first.assignments.iter().all(|a| a.cluster < 4));

    let out = dir.path().join("rfq_clusters.csv");
    write_clusters(&out, &first.assignments).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 6);
    assert_eq!(text.lines().next(), Some("id,cluster"));

    assert!(cluster(&features, &ClusterConfig::default().with_k(6)).is_err());
}

#[test]
fn test_missing_identifier_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rfq.csv"), "grade,finish\nS235JR,GI\n").unwrap();
    assert!(prepare(&dir.path().join("rfq.csv"), None, &Settings::default()).is_err());
}
