//! Reference dataset I/O
//!
//! Input: `battery_type,total_dist_km,charging_time_min,SOH_teacher`.
//! Scoring runs the raw cascade (no fusion): calibration measures the
//! student model against the teacher value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::roc::RocPoint;
use super::CalibrationReport;
use crate::error::{SohError, SohResult};
use crate::logic::features::{LatentFeatureVector, VehicleInput};
use crate::logic::model::ModelBundle;
use crate::logic::pipeline::{DegradationStage, LatentFeatureStage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub battery_type: String,
    pub total_dist_km: f64,
    pub charging_time_min: f64,
    /// Reference degradation from the high-fidelity model
    #[serde(rename = "SOH_teacher")]
    pub soh_teacher: f64,
}

impl ReferenceRecord {
    pub fn input(&self) -> VehicleInput {
        VehicleInput::new(self.battery_type.clone(), self.total_dist_km, self.charging_time_min)
    }
}

pub fn read_reference(path: &Path) -> SohResult<Vec<ReferenceRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    log::info!("Loaded {} reference rows from {}", records.len(), path.display());
    Ok(records)
}

/// Reference row with its cascade outputs
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: ReferenceRecord,
    pub latent: LatentFeatureVector,
    pub prediction: f64,
}

pub fn score_reference(bundle: &ModelBundle, records: Vec<ReferenceRecord>) -> SohResult<Vec<ScoredRecord>> {
    let latent_stage = LatentFeatureStage::new(bundle);
    let degradation_stage = DegradationStage::new(bundle);

    records
        .into_iter()
        .map(|record| {
            let input = record.input();
            let latent = latent_stage.predict_latent(&input)?;
            let prediction = degradation_stage.predict_degradation(&input, latent)?;
            Ok(ScoredRecord { record, latent, prediction })
        })
        .collect()
}

// ============================================================================
// OUTPUT TABLES
// ============================================================================

#[derive(Debug, Serialize)]
struct AnomalyResultRow<'a> {
    battery_type: &'a str,
    total_dist_km: f64,
    charging_time_min: f64,
    #[serde(rename = "SOH_teacher")]
    soh_teacher: f64,
    pred_charging_cycles: f64,
    pred_efficiency: f64,
    pred_battery_temp: f64,
    #[serde(rename = "SOH_student")]
    soh_student: f64,
    residual: f64,
    is_anomaly_detected: bool,
    true_anomaly_label: u8,
}

fn create_writer(path: &Path) -> SohResult<csv::Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}

/// Per-row results, in input order
pub fn write_results(path: &Path, scored: &[ScoredRecord], report: &CalibrationReport) -> SohResult<()> {
    if scored.len() != report.residuals.len() {
        return Err(SohError::internal(
            "calibration",
            format!("{} scored rows but {} residuals", scored.len(), report.residuals.len()),
        ));
    }

    let mut writer = create_writer(path)?;
    for (i, s) in scored.iter().enumerate() {
        writer.serialize(AnomalyResultRow {
            battery_type: &s.record.battery_type,
            total_dist_km: s.record.total_dist_km,
            charging_time_min: s.record.charging_time_min,
            soh_teacher: s.record.soh_teacher,
            pred_charging_cycles: s.latent.predicted_charging_cycles,
            pred_efficiency: s.latent.predicted_efficiency,
            pred_battery_temp: s.latent.predicted_battery_temp,
            soh_student: s.prediction,
            residual: report.residuals[i],
            is_anomaly_detected: report.detected[i],
            true_anomaly_label: u8::from(report.synthetic_labels[i]),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_roc(path: &Path, points: &[RocPoint]) -> SohResult<()> {
    let mut writer = create_writer(path)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_reference_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("student_data.csv");
        fs::write(
            &path,
            "battery_type,total_dist_km,charging_time_min,SOH_teacher\nLFP,12000,35.5,4.2\nNMC,80000,60,17.9\n",
        )
        .unwrap();

        let records = read_reference(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].battery_type, "LFP");
        assert_eq!(records[1].soh_teacher, 17.9);
        assert_eq!(records[0].input().charging_time_min, 35.5);
    }

    #[test]
    fn test_bad_row_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "battery_type,total_dist_km,charging_time_min,SOH_teacher\nLFP,abc,1,1\n").unwrap();

        assert!(matches!(read_reference(&path), Err(SohError::Csv(_))));
    }
}
