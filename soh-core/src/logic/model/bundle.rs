//! Model Bundle - the four cascade estimators, loaded once
//!
//! Built at startup from `manifest.json` and never mutated afterwards.
//! A slot whose artifact is missing or corrupt stays empty; the service
//! keeps running and requests that need the slot fail with
//! `ModelUnavailable`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::estimator::{Estimator, EstimatorKind};
use super::linear::LinearEstimator;
use super::onnx::OnnxEstimator;
use crate::constants::MANIFEST_FILE;
use crate::error::{SohError, SohResult};
use crate::logic::features::{FeatureLayout, FEATURE_VERSION};

// ============================================================================
// ROLES
// ============================================================================

/// Position of an estimator in the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    ChargingCycles,
    Efficiency,
    BatteryTemp,
    Stage2,
}

impl ModelRole {
    pub const ALL: [ModelRole; 4] = [
        ModelRole::ChargingCycles,
        ModelRole::Efficiency,
        ModelRole::BatteryTemp,
        ModelRole::Stage2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::ChargingCycles => "charging_cycles",
            ModelRole::Efficiency => "efficiency",
            ModelRole::BatteryTemp => "battery_temp",
            ModelRole::Stage2 => "stage2",
        }
    }

    /// Layout the role's estimator must have been fit against
    pub fn layout(&self) -> FeatureLayout {
        match self {
            ModelRole::Stage2 => FeatureLayout::Stage2,
            _ => FeatureLayout::Stage1,
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MANIFEST
// ============================================================================

/// One estimator artifact on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub file: String,
    pub kind: EstimatorKind,
    pub layout: FeatureLayout,
    pub feature_version: u8,
    pub layout_hash: u32,
    /// Hex SHA-256 of the file; checked when present
    #[serde(default)]
    pub sha256: Option<String>,
    /// One-hot chemistry order (ONNX only)
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ArtifactEntry {
    /// Entry for the current layout of `role`
    pub fn current(file: &str, kind: EstimatorKind, role: ModelRole) -> Self {
        let layout = role.layout();
        Self {
            file: file.to_string(),
            kind,
            layout,
            feature_version: FEATURE_VERSION,
            layout_hash: layout.hash(),
            sha256: None,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub models: BTreeMap<ModelRole, ArtifactEntry>,
}

impl ModelManifest {
    pub fn load(path: &Path) -> SohResult<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn save(&self, path: &Path) -> SohResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Hex SHA-256 of an artifact
pub fn artifact_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ============================================================================
// BUNDLE
// ============================================================================

/// Immutable set of cascade estimators
#[derive(Debug, Clone)]
pub struct ModelBundle {
    slots: BTreeMap<ModelRole, Arc<dyn Estimator>>,
    loaded_at: DateTime<Utc>,
}

impl ModelBundle {
    pub fn builder() -> ModelBundleBuilder {
        ModelBundleBuilder::default()
    }

    /// Load every artifact listed in `<dir>/manifest.json`.
    ///
    /// Never fails: a missing manifest yields an empty bundle, a bad artifact
    /// an empty slot. Both are logged.
    pub fn load_from_dir(dir: &Path) -> Self {
        let manifest_path = dir.join(MANIFEST_FILE);
        let mut builder = Self::builder();

        let manifest = match ModelManifest::load(&manifest_path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Model manifest unavailable at {}: {}", manifest_path.display(), e);
                return builder.build();
            }
        };

        for role in ModelRole::ALL {
            let Some(entry) = manifest.models.get(&role) else {
                log::warn!("Manifest has no entry for '{}'", role);
                continue;
            };

            match load_artifact(dir, role, entry) {
                Ok(estimator) => {
                    log::info!("Loaded {} estimator '{}' ({:?})", role, estimator.name(), estimator.kind());
                    builder = builder.with(role, estimator);
                }
                Err(e) => log::error!("Failed to load {} estimator: {}", role, e),
            }
        }

        builder.build()
    }

    /// Like `load_from_dir`, but every role must load
    pub fn load_strict(dir: &Path) -> SohResult<Self> {
        let manifest = ModelManifest::load(&dir.join(MANIFEST_FILE))?;
        let mut builder = Self::builder();

        for role in ModelRole::ALL {
            let entry = manifest
                .models
                .get(&role)
                .ok_or_else(|| SohError::model_unavailable(role.as_str(), "missing from manifest"))?;
            builder = builder.with(role, load_artifact(dir, role, entry)?);
        }

        Ok(builder.build())
    }

    /// Estimator for `role`, or `ModelUnavailable`
    pub fn get(&self, role: ModelRole) -> SohResult<&dyn Estimator> {
        self.slots
            .get(&role)
            .map(|e| e.as_ref())
            .ok_or_else(|| SohError::model_unavailable(role.as_str(), "not loaded"))
    }

    pub fn is_loaded(&self, role: ModelRole) -> bool {
        self.slots.contains_key(&role)
    }

    pub fn is_complete(&self) -> bool {
        ModelRole::ALL.iter().all(|r| self.is_loaded(*r))
    }

    pub fn status(&self) -> BundleStatus {
        BundleStatus {
            complete: self.is_complete(),
            loaded_at: self.loaded_at,
            models: ModelRole::ALL
                .iter()
                .map(|role| {
                    let slot = self.slots.get(role);
                    SlotStatus {
                        role: *role,
                        loaded: slot.is_some(),
                        name: slot.map(|e| e.name().to_string()),
                        kind: slot.map(|e| e.kind()),
                        layout_hash: role.layout().hash(),
                    }
                })
                .collect(),
        }
    }
}

fn load_artifact(dir: &Path, role: ModelRole, entry: &ArtifactEntry) -> SohResult<Arc<dyn Estimator>> {
    if entry.layout != role.layout() {
        return Err(SohError::model_unavailable(
            role.as_str(),
            format!("artifact layout {:?} does not fit role", entry.layout),
        ));
    }
    entry.layout.validate(entry.feature_version, entry.layout_hash)?;

    let path = dir.join(&entry.file);
    let bytes = fs::read(&path).map_err(|e| {
        SohError::model_unavailable(role.as_str(), format!("{}: {}", path.display(), e))
    })?;

    if let Some(expected) = &entry.sha256 {
        let actual = artifact_checksum(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(SohError::model_unavailable(
                role.as_str(),
                format!("checksum mismatch: expected {}, got {}", expected, actual),
            ));
        }
    }

    let estimator: Arc<dyn Estimator> = match entry.kind {
        EstimatorKind::Linear => {
            let est = LinearEstimator::from_slice(&bytes)?;
            if est.layout() != entry.layout {
                return Err(SohError::model_unavailable(
                    role.as_str(),
                    "linear spec layout disagrees with manifest",
                ));
            }
            Arc::new(est)
        }
        EstimatorKind::Onnx => Arc::new(OnnxEstimator::from_bytes(
            role.as_str(),
            &bytes,
            entry.layout,
            entry.categories.clone(),
        )?),
    };

    Ok(estimator)
}

// ============================================================================
// BUILDER PATTERN
// ============================================================================

#[derive(Default)]
pub struct ModelBundleBuilder {
    slots: BTreeMap<ModelRole, Arc<dyn Estimator>>,
}

impl ModelBundleBuilder {
    pub fn with(mut self, role: ModelRole, estimator: Arc<dyn Estimator>) -> Self {
        self.slots.insert(role, estimator);
        self
    }

    pub fn charging_cycles(self, estimator: Arc<dyn Estimator>) -> Self {
        self.with(ModelRole::ChargingCycles, estimator)
    }

    pub fn efficiency(self, estimator: Arc<dyn Estimator>) -> Self {
        self.with(ModelRole::Efficiency, estimator)
    }

    pub fn battery_temp(self, estimator: Arc<dyn Estimator>) -> Self {
        self.with(ModelRole::BatteryTemp, estimator)
    }

    pub fn stage2(self, estimator: Arc<dyn Estimator>) -> Self {
        self.with(ModelRole::Stage2, estimator)
    }

    pub fn build(self) -> ModelBundle {
        ModelBundle {
            slots: self.slots,
            loaded_at: Utc::now(),
        }
    }
}

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatus {
    pub role: ModelRole,
    pub loaded: bool,
    pub name: Option<String>,
    pub kind: Option<EstimatorKind>,
    pub layout_hash: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleStatus {
    pub complete: bool,
    pub loaded_at: DateTime<Utc>,
    pub models: Vec<SlotStatus>,
}
