use std::fs;
use std::path::Path;

use super::bundle::{artifact_checksum, ArtifactEntry, ModelBundle, ModelManifest, ModelRole};
use super::estimator::EstimatorKind;
use super::linear::{LinearEstimator, LinearModelSpec};
use crate::constants::MANIFEST_FILE;
use crate::error::SohError;
use crate::logic::features::{FeatureLayout, FeatureSet, VehicleInput};

fn write_linear(dir: &Path, role: ModelRole, intercept: f64) -> ArtifactEntry {
    let layout = role.layout();
    let spec = LinearModelSpec {
        name: role.as_str().to_string(),
        layout,
        intercept,
        weights: vec![0.0; layout.numeric_count()],
        scaler: None,
        chemistry_offsets: Default::default(),
    };
    let file = format!("{}.json", role.as_str());
    let bytes = serde_json::to_vec(&spec).unwrap();
    fs::write(dir.join(&file), &bytes).unwrap();

    let mut entry = ArtifactEntry::current(&file, EstimatorKind::Linear, role);
    entry.sha256 = Some(artifact_checksum(&bytes));
    entry
}

fn write_full_manifest(dir: &Path) -> ModelManifest {
    let mut manifest = ModelManifest::default();
    for (i, role) in ModelRole::ALL.iter().enumerate() {
        manifest.models.insert(*role, write_linear(dir, *role, i as f64));
    }
    manifest.save(&dir.join(MANIFEST_FILE)).unwrap();
    manifest
}

#[test]
fn test_load_complete_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_full_manifest(dir.path());

    let bundle = ModelBundle::load_from_dir(dir.path());
    assert!(bundle.is_complete());

    let row = VehicleInput::new("NMC", 1.0, 1.0).stage1().to_row();
    let eff = bundle.get(ModelRole::Efficiency).unwrap();
    assert_eq!(eff.predict(&row).unwrap(), 1.0);

    let strict = ModelBundle::load_strict(dir.path()).unwrap();
    assert!(strict.is_complete());
}

#[test]
fn test_missing_manifest_yields_empty_bundle() {
    let dir = tempfile::tempdir().unwrap();

    let bundle = ModelBundle::load_from_dir(dir.path());
    assert!(!bundle.is_complete());
    assert!(matches!(
        bundle.get(ModelRole::Stage2),
        Err(SohError::ModelUnavailable { .. })
    ));
    assert!(ModelBundle::load_strict(dir.path()).is_err());
}

#[test]
fn test_checksum_mismatch_leaves_slot_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut manifest = write_full_manifest(dir.path());
    manifest.models.get_mut(&ModelRole::Stage2).unwrap().sha256 = Some("00".repeat(32));
    manifest.save(&dir.path().join(MANIFEST_FILE)).unwrap();

    let bundle = ModelBundle::load_from_dir(dir.path());
    assert!(bundle.is_loaded(ModelRole::ChargingCycles));
    assert!(!bundle.is_loaded(ModelRole::Stage2));

    match ModelBundle::load_strict(dir.path()) {
        Err(SohError::ModelUnavailable { model, reason }) => {
            assert_eq!(model, "stage2");
            assert!(reason.contains("checksum"));
        }
        other => panic!("Expected ModelUnavailable, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_layout_hash_mismatch_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut manifest = write_full_manifest(dir.path());
    manifest.models.get_mut(&ModelRole::Efficiency).unwrap().layout_hash ^= 0xFFFF;
    manifest.save(&dir.path().join(MANIFEST_FILE)).unwrap();

    let bundle = ModelBundle::load_from_dir(dir.path());
    assert!(!bundle.is_loaded(ModelRole::Efficiency));
    assert!(matches!(
        ModelBundle::load_strict(dir.path()),
        Err(SohError::LayoutMismatch(_))
    ));
}

#[test]
fn test_role_layout_mismatch_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut manifest = write_full_manifest(dir.path());
    // A stage-1 artifact registered as the stage-2 model
    let stage1_entry = manifest.models[&ModelRole::ChargingCycles].clone();
    manifest.models.insert(ModelRole::Stage2, stage1_entry);
    manifest.save(&dir.path().join(MANIFEST_FILE)).unwrap();

    let bundle = ModelBundle::load_from_dir(dir.path());
    assert!(!bundle.is_loaded(ModelRole::Stage2));
}

#[test]
fn test_missing_artifact_file() {
    let dir = tempfile::tempdir().unwrap();
    write_full_manifest(dir.path());
    fs::remove_file(dir.path().join("battery_temp.json")).unwrap();

    let bundle = ModelBundle::load_from_dir(dir.path());
    assert!(!bundle.is_loaded(ModelRole::BatteryTemp));
    assert!(bundle.is_loaded(ModelRole::Efficiency));
}

#[test]
fn test_builder_and_status() {
    use std::sync::Arc;

    let bundle = ModelBundle::builder()
        .charging_cycles(Arc::new(LinearEstimator::constant("c", FeatureLayout::Stage1, 1.0)))
        .stage2(Arc::new(LinearEstimator::constant("s2", FeatureLayout::Stage2, 2.0)))
        .build();

    let status = bundle.status();
    assert!(!status.complete);
    assert_eq!(status.models.len(), 4);

    let stage2 = status.models.iter().find(|s| s.role == ModelRole::Stage2).unwrap();
    assert!(stage2.loaded);
    assert_eq!(stage2.name.as_deref(), Some("s2"));
    assert_eq!(stage2.layout_hash, FeatureLayout::Stage2.hash());

    let temp = status.models.iter().find(|s| s.role == ModelRole::BatteryTemp).unwrap();
    assert!(!temp.loaded);
}

#[test]
fn test_manifest_json_uses_role_names() {
    let mut manifest = ModelManifest::default();
    manifest.models.insert(
        ModelRole::ChargingCycles,
        ArtifactEntry::current("stage1_charging_cycles.onnx", EstimatorKind::Onnx, ModelRole::ChargingCycles),
    );

    let json = serde_json::to_value(&manifest).unwrap();
    assert_eq!(json["models"]["charging_cycles"]["kind"], "onnx");
    assert_eq!(json["models"]["charging_cycles"]["layout"], "stage1");
}
