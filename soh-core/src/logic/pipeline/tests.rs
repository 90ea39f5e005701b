use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::*;
use crate::error::{SohError, SohResult};
use crate::logic::config::PipelineConfig;
use crate::logic::features::{FeatureLayout, FeatureRow, LatentFeatureVector, VehicleInput};
use crate::logic::metrics::ValuationContext;
use crate::logic::model::{
    Estimator, EstimatorKind, LinearEstimator, LinearModelSpec, LoadedThreshold, ModelBundle,
    ThresholdSource,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// Stage 2 stub that remembers the last row it saw
#[derive(Debug)]
struct RecordingEstimator {
    value: f64,
    seen: Mutex<Option<Vec<f64>>>,
}

impl Estimator for RecordingEstimator {
    fn name(&self) -> &str {
        "recording"
    }

    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Linear
    }

    fn layout(&self) -> FeatureLayout {
        FeatureLayout::Stage2
    }

    fn predict(&self, row: &FeatureRow) -> SohResult<f64> {
        *self.seen.lock() = Some(row.values().to_vec());
        Ok(self.value)
    }
}

fn constant(name: &str, layout: FeatureLayout, value: f64) -> Arc<dyn Estimator> {
    Arc::new(LinearEstimator::constant(name, layout, value))
}

/// Cycles grow with distance, everything else flat
fn responsive_bundle(stage2_value: f64) -> ModelBundle {
    let cycles = LinearEstimator::new(LinearModelSpec {
        name: "cycles".to_string(),
        layout: FeatureLayout::Stage1,
        intercept: 10.0,
        weights: vec![0.002, 0.5],
        scaler: None,
        chemistry_offsets: [("LFP".to_string(), 25.0)].into_iter().collect(),
    })
    .unwrap();

    ModelBundle::builder()
        .charging_cycles(Arc::new(cycles))
        .efficiency(constant("eff", FeatureLayout::Stage1, 92.0))
        .battery_temp(constant("temp", FeatureLayout::Stage1, 31.5))
        .stage2(constant("s2", FeatureLayout::Stage2, stage2_value))
        .build()
}

fn orchestrator(bundle: ModelBundle) -> InferenceOrchestrator {
    InferenceOrchestrator::new(
        Arc::new(bundle),
        LoadedThreshold::calibrated(26.9),
        Arc::new(PipelineConfig::default()),
    )
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn request(battery: &str, km: f64, minutes: f64) -> PredictionRequest {
    PredictionRequest {
        input: VehicleInput::new(battery, km, minutes),
        valuation: ValuationContext {
            buying_price: 40_000.0,
            buying_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            today: today(),
        },
    }
}

// ============================================================================
// STAGES
// ============================================================================

#[test]
fn test_stage2_receives_latent_in_order() {
    let recorder = Arc::new(RecordingEstimator { value: 5.0, seen: Mutex::new(None) });
    let bundle = ModelBundle::builder()
        .charging_cycles(constant("c", FeatureLayout::Stage1, 150.0))
        .efficiency(constant("e", FeatureLayout::Stage1, 88.0))
        .battery_temp(constant("t", FeatureLayout::Stage1, 33.0))
        .stage2(recorder.clone())
        .build();

    let input = VehicleInput::new("NMC", 12_000.0, 40.0);
    let latent = LatentFeatureStage::new(&bundle).predict_latent(&input).unwrap();
    let raw = DegradationStage::new(&bundle).predict_degradation(&input, latent).unwrap();

    assert_eq!(raw, 5.0);
    assert_eq!(
        recorder.seen.lock().clone().unwrap(),
        vec![12_000.0, 40.0, 150.0, 88.0, 33.0]
    );
}

#[test]
fn test_missing_stage1_model_aborts() {
    let bundle = ModelBundle::builder()
        .charging_cycles(constant("c", FeatureLayout::Stage1, 1.0))
        .battery_temp(constant("t", FeatureLayout::Stage1, 1.0))
        .stage2(constant("s2", FeatureLayout::Stage2, 1.0))
        .build();

    let err = orchestrator(bundle).run(&request("NMC", 1.0, 1.0)).unwrap_err();
    match err {
        SohError::ModelUnavailable { model, .. } => assert_eq!(model, "efficiency"),
        other => panic!("Expected ModelUnavailable, got {:?}", other),
    }
}

#[test]
fn test_missing_stage2_model_aborts() {
    let bundle = ModelBundle::builder()
        .charging_cycles(constant("c", FeatureLayout::Stage1, 1.0))
        .efficiency(constant("e", FeatureLayout::Stage1, 1.0))
        .battery_temp(constant("t", FeatureLayout::Stage1, 1.0))
        .build();

    assert!(matches!(
        orchestrator(bundle).predict(&request("NMC", 1.0, 1.0)),
        Err(SohError::ModelUnavailable { .. })
    ));
}

#[test]
fn test_non_finite_latent_is_internal_error() {
    let bundle = ModelBundle::builder()
        .charging_cycles(constant("c", FeatureLayout::Stage1, 1.0))
        .efficiency(constant("e", FeatureLayout::Stage1, f64::INFINITY))
        .battery_temp(constant("t", FeatureLayout::Stage1, 1.0))
        .stage2(constant("s2", FeatureLayout::Stage2, 1.0))
        .build();

    assert!(matches!(
        orchestrator(bundle).run(&request("NMC", 1.0, 1.0)),
        Err(SohError::InternalComputation { stage: "latent", .. })
    ));
}

#[test]
fn test_stage2_rejects_stage1_artifact() {
    let bundle = ModelBundle::builder()
        .charging_cycles(constant("c", FeatureLayout::Stage1, 1.0))
        .efficiency(constant("e", FeatureLayout::Stage1, 1.0))
        .battery_temp(constant("t", FeatureLayout::Stage1, 1.0))
        .stage2(constant("wrong", FeatureLayout::Stage1, 1.0))
        .build();

    assert!(matches!(
        orchestrator(bundle).run(&request("NMC", 1.0, 1.0)),
        Err(SohError::InternalComputation { stage: "estimator", .. })
    ));
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_zero_input_scenario() {
    // cycles at 0 km / 0 min = intercept 10 -> cycle_decay 0.05
    let outcome = orchestrator(responsive_bundle(0.0)).run(&request("NMC", 0.0, 0.0)).unwrap();

    assert_eq!(outcome.latent.predicted_charging_cycles, 10.0);
    assert!((outcome.estimate.physics_degradation - 0.05).abs() < 1e-12);
    assert!((outcome.estimate.final_degradation - 0.03).abs() < 1e-12);
    assert_eq!(outcome.estimate.predicted_soh, 100.0 - outcome.estimate.final_degradation);
    assert_eq!(outcome.valuation.estimated_soc, 20.0);
}

#[test]
fn test_long_charge_soc_saturates() {
    let report = orchestrator(responsive_bundle(5.0)).predict(&request("NMC", 10_000.0, 100.0)).unwrap();
    assert_eq!(report.estimated_soc, 100.0);
}

#[test]
fn test_anomaly_boundary_at_fixed_cutoff() {
    // Pass the raw prediction straight through fusion
    let mut config = PipelineConfig::default();
    config.fusion.model_weight = 1.0;
    config.fusion.physics_weight = 0.0;
    let config = Arc::new(config);

    let orch = |raw: f64| {
        let bundle = ModelBundle::builder()
            .charging_cycles(constant("c", FeatureLayout::Stage1, 0.0))
            .efficiency(constant("e", FeatureLayout::Stage1, 90.0))
            .battery_temp(constant("t", FeatureLayout::Stage1, 30.0))
            .stage2(constant("s2", FeatureLayout::Stage2, raw))
            .build();
        InferenceOrchestrator::new(Arc::new(bundle), LoadedThreshold::calibrated(26.9), config.clone())
    };

    let at = orch(27.0).predict(&request("NMC", 0.0, 0.0)).unwrap();
    assert_eq!(at.degradation_rate, 27.0);
    assert!(!at.anomaly_warning);
    assert_eq!(at.risk_rating, RiskLabel::Low);

    let above = orch(27.0001).predict(&request("NMC", 0.0, 0.0)).unwrap();
    assert_eq!(above.degradation_rate, 27.0001);
    assert!(above.anomaly_warning);
    assert_eq!(above.risk_rating, RiskLabel::High);

    // Reported threshold is the calibrated one, not the cutoff
    assert_eq!(above.anomaly_threshold, 26.9);
}

#[test]
fn test_calibrated_threshold_can_drive_serving() {
    let mut config = PipelineConfig::default();
    config.anomaly.serving_cutoff = None;

    let orch = InferenceOrchestrator::new(
        Arc::new(responsive_bundle(30.0)),
        LoadedThreshold::calibrated(5.0),
        Arc::new(config),
    );
    assert_eq!(orch.cutoff(), 5.0);

    let report = orch.predict(&request("NMC", 20_000.0, 30.0)).unwrap();
    assert!(report.anomaly_warning);
}

#[test]
fn test_fallback_threshold_reported() {
    let orch = InferenceOrchestrator::new(
        Arc::new(responsive_bundle(1.0)),
        LoadedThreshold::fallback(),
        Arc::new(PipelineConfig::default()),
    );
    assert_eq!(orch.threshold().source, ThresholdSource::Fallback);

    let report = orch.predict(&request("NMC", 1.0, 1.0)).unwrap();
    assert_eq!(report.anomaly_threshold, 10.0);
    assert_eq!(orch.cutoff(), 27.0);
}

#[test]
fn test_report_shape() {
    let report = orchestrator(responsive_bundle(8.0)).predict(&request("LFP_Type2", 30_000.0, 45.0)).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["risk_rating"], "Low Risk");
    assert_eq!(json["material_composition"]["iron_g"], 48000);
    assert!(json["latent_features"]["pred_charging_cycles"].as_f64().unwrap() > 0.0);
    assert_eq!(
        json["calculation_note"],
        "Estimates based on ANL BatPaC Model & Straight-line Depreciation."
    );
    // Rounded to cents
    let cents = report.resale_value_usd * 100.0;
    assert!((cents - cents.round()).abs() < 1e-6);
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_random_inputs_respect_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    let chemistries = ["NMC", "LFP", "NCA", "LiFePO4", "Unknown"];

    for _ in 0..500 {
        let orch = orchestrator(responsive_bundle(rng.gen_range(-20.0..120.0)));
        let chem = chemistries[rng.gen_range(0..chemistries.len())];
        let req = request(chem, rng.gen_range(0.0..400_000.0), rng.gen_range(0.0..300.0));

        let outcome = orch.run(&req).unwrap();
        let est = outcome.estimate;
        assert!((0.0..=40.0).contains(&est.final_degradation));
        assert_eq!(est.predicted_soh, 100.0 - est.final_degradation);
        assert!((0.0..=100.0).contains(&outcome.valuation.estimated_soc));
        assert!(outcome.valuation.resale_value_usd >= 0.0);
    }
}

#[test]
fn test_physics_monotone_in_distance() {
    let config = FusionConfig::default();
    let engine = PhysicsFusionEngine::new(&config);
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..200 {
        let cycles = rng.gen_range(0.0..2000.0);
        let a = rng.gen_range(0.0..300_000.0);
        let b = a + rng.gen_range(0.0..100_000.0);
        assert!(engine.physics_degradation(b, cycles) >= engine.physics_degradation(a, cycles));
    }
}

#[test]
fn test_repeated_runs_identical() {
    let orch = orchestrator(responsive_bundle(12.0));
    let req = request("NMC", 55_555.5, 37.0);

    let first = serde_json::to_vec(&orch.predict(&req).unwrap()).unwrap();
    for _ in 0..10 {
        assert_eq!(serde_json::to_vec(&orch.predict(&req).unwrap()).unwrap(), first);
    }
}

#[test]
fn test_latent_named_in_report() {
    let outcome = orchestrator(responsive_bundle(1.0)).run(&request("LFP", 1000.0, 10.0)).unwrap();
    // 10 + 0.002*1000 + 0.5*10 + LFP offset 25 = 42
    assert_eq!(
        outcome.latent,
        LatentFeatureVector {
            predicted_charging_cycles: 42.0,
            predicted_efficiency: 92.0,
            predicted_battery_temp: 31.5,
        }
    );
    let report = outcome.report(&LoadedThreshold::calibrated(1.0));
    assert_eq!(report.latent_features["pred_charging_cycles"], 42.0);
}
