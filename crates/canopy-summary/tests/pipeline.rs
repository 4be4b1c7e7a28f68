//! End-to-end integration tests: CSV -> bagging -> leaf store -> merge.

use std::path::{Path, PathBuf};

use canopy_data::{DataMatrix, FeatureKind, IndexView, TableReader};
use canopy_summary::{BaggingConfig, LeafStore, Merged, SummaryError, SummarySet};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn bag_store_and_merge() {
    // 1. Read CSV
    let table = TableReader::new(&fixture_path("leaves_12x4.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(table.n_rows(), 12);
    assert_eq!(table.n_features(), 4);
    assert_eq!(table.feature_kind(3), FeatureKind::Discrete);
    assert_eq!(table.category_count(3), 3);

    // 2. Bag with a bivariate summary over (length, width)
    let result = BaggingConfig::new(6)
        .unwrap()
        .with_seed(42)
        .with_codes(Some("BNGC".to_string()))
        .fit(&table)
        .unwrap();
    let oob = result.oob_error().expect("oob enabled by default");
    assert_eq!(oob.total.len(), 4);
    assert_eq!(oob.total[1], 0.0);

    // 3. Persist and reload
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("leaves.bin");
    result.store().save(&path).unwrap();
    let loaded = LeafStore::load(&path).unwrap();
    assert_eq!(&loaded, result.store());

    // 4. Merge all bags as one exemplar
    let merged = SummarySet::merge(loaded.sets()).unwrap();
    assert_eq!(merged.len(), 4);
    assert!(matches!(merged.get(0), Some(Merged::BiGaussian { .. })));
    assert!(matches!(merged.get(1), Some(Merged::Nothing)));
    let Some(Merged::Categorical { probabilities }) = merged.get(3) else {
        panic!("expected categorical species distribution");
    };
    assert_eq!(probabilities.len(), 3);
    assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    // 5. Same data, split as 3 exemplars x 2 trees
    let batch = SummarySet::merge_many(3, 2, loaded.sets()).unwrap();
    assert_eq!(batch.n_exemplars(), 3);
    assert_eq!(batch.feature(2).unwrap().len(), 3);
}

#[test]
fn json_output_is_tagged_by_kind() {
    let table = TableReader::new(&fixture_path("leaves_12x4.csv"))
        .read()
        .unwrap();
    let store = BaggingConfig::new(2)
        .unwrap()
        .fit(&table)
        .unwrap()
        .into_store();
    let merged = SummarySet::merge(store.sets()).unwrap();
    let json = serde_json::to_value(&merged).unwrap();
    assert_eq!(json[0]["kind"], "gaussian");
    assert_eq!(json[3]["kind"], "categorical");
    assert!(json[0]["mean"].is_number());
}

#[test]
fn categorical_codes_on_numeric_column_fail() {
    let table = TableReader::new(&fixture_path("leaves_12x4.csv"))
        .read()
        .unwrap();
    let err = BaggingConfig::new(2)
        .unwrap()
        .with_codes(Some("C".to_string()))
        .fit(&table)
        .unwrap_err();
    assert!(matches!(err, SummaryError::NotDiscrete { feature: 0 }));
}

#[test]
fn forcing_a_column_discrete_enables_categorical() {
    let table = TableReader::new(&fixture_path("leaves_12x4.csv"))
        .with_discrete(vec!["width".to_string()])
        .read()
        .unwrap();
    assert_eq!(table.feature_kind(1), FeatureKind::Discrete);
    let set = SummarySet::new(&table, &IndexView::all(12), None).unwrap();
    assert_eq!(set.codes(), "GCGC");
}
