//! Inference Orchestrator
//!
//! Latent → Degradation → Fusion → Anomaly → Derived metrics, in that order,
//! once per request. Any stage error aborts the run with that error.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::anomaly::{AnomalyClassifier, AnomalyVerdict, RiskLabel};
use super::degradation::DegradationStage;
use super::fusion::{DegradationEstimate, PhysicsFusionEngine};
use super::latent::LatentFeatureStage;
use crate::constants::CALCULATION_NOTE;
use crate::error::SohResult;
use crate::logic::config::PipelineConfig;
use crate::logic::features::{LatentFeatureVector, VehicleInput};
use crate::logic::metrics::{
    DerivedMetricsCalculator, MaterialComposition, ValuationContext, ValuationResult,
};
use crate::logic::model::{LoadedThreshold, ModelBundle};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub input: VehicleInput,
    pub valuation: ValuationContext,
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub input: VehicleInput,
    pub latent: LatentFeatureVector,
    pub estimate: DegradationEstimate,
    pub verdict: AnomalyVerdict,
    pub valuation: ValuationResult,
}

/// Response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub predicted_soh: f64,
    pub degradation_rate: f64,
    pub estimated_soc: f64,
    pub latent_features: BTreeMap<String, f64>,
    pub anomaly_warning: bool,
    pub anomaly_threshold: f64,
    pub resale_value_usd: f64,
    pub material_composition: MaterialComposition,
    pub risk_rating: RiskLabel,
    pub calculation_note: String,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl PipelineOutcome {
    /// `anomaly_threshold` is the loaded threshold, whatever cutoff was served
    pub fn report(&self, threshold: &LoadedThreshold) -> PredictionReport {
        PredictionReport {
            predicted_soh: self.estimate.predicted_soh,
            degradation_rate: self.estimate.final_degradation,
            estimated_soc: round_to(self.valuation.estimated_soc, 1),
            latent_features: self.latent.named(),
            anomaly_warning: self.verdict.is_anomaly,
            anomaly_threshold: threshold.value,
            resale_value_usd: round_to(self.valuation.resale_value_usd, 2),
            material_composition: self.valuation.material_composition.clone(),
            risk_rating: self.verdict.risk_label,
            calculation_note: CALCULATION_NOTE.to_string(),
        }
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Shared, read-only after construction
#[derive(Debug, Clone)]
pub struct InferenceOrchestrator {
    bundle: Arc<ModelBundle>,
    threshold: LoadedThreshold,
    cutoff: f64,
    config: Arc<PipelineConfig>,
}

impl InferenceOrchestrator {
    pub fn new(bundle: Arc<ModelBundle>, threshold: LoadedThreshold, config: Arc<PipelineConfig>) -> Self {
        let threshold = config.anomaly.effective_threshold(&threshold);
        let cutoff = config.anomaly.resolve_cutoff(&threshold);

        log::info!(
            "Orchestrator ready: threshold={:.4} ({:?}), serving cutoff={:.4}, models complete={}",
            threshold.value,
            threshold.source,
            cutoff,
            bundle.is_complete()
        );

        Self { bundle, threshold, cutoff, config }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn threshold(&self) -> LoadedThreshold {
        self.threshold
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, request: &PredictionRequest) -> SohResult<PipelineOutcome> {
        let input = &request.input;

        let latent = LatentFeatureStage::new(&self.bundle).predict_latent(input)?;
        let raw = DegradationStage::new(&self.bundle).predict_degradation(input, latent)?;
        let estimate = PhysicsFusionEngine::new(&self.config.fusion).fuse(raw, input, &latent)?;
        log::debug!("Fusion: {:?}", estimate);

        let verdict = AnomalyClassifier::classify(estimate.final_degradation, self.cutoff);

        let valuation = DerivedMetricsCalculator {
            soc: &self.config.soc,
            resale: &self.config.resale,
            materials: &self.config.materials,
        }
        .calculate(input, estimate.predicted_soh, &request.valuation);

        log::info!(
            "[{}] raw={:.2} physics={:.2} final={:.2} soh={:.2} -> {}",
            input.battery_type,
            estimate.raw_model_degradation,
            estimate.physics_degradation,
            estimate.final_degradation,
            estimate.predicted_soh,
            verdict.risk_label
        );

        Ok(PipelineOutcome {
            input: input.clone(),
            latent,
            estimate,
            verdict,
            valuation,
        })
    }

    /// Run and shape the response
    pub fn predict(&self, request: &PredictionRequest) -> SohResult<PredictionReport> {
        Ok(self.run(request)?.report(&self.threshold))
    }
}
