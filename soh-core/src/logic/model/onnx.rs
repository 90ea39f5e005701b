//! ONNX Estimator - ONNX Runtime Integration
//!
//! Runs a regressor exported to ONNX with a single float input of shape
//! `[1, numeric_count + categories.len()]`: numeric columns in layout order,
//! then the one-hot chemistry block (unknown chemistry = all zeros).

use std::fmt;

use ndarray::Array2;
use parking_lot::Mutex;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use super::estimator::{ensure_layout, Estimator, EstimatorKind};
use crate::error::{SohError, SohResult};
use crate::logic::features::{FeatureLayout, FeatureRow};

pub struct OnnxEstimator {
    name: String,
    layout: FeatureLayout,
    categories: Vec<String>,
    source: String,
    // ort sessions need &mut to run
    session: Mutex<Session>,
}

impl OnnxEstimator {
    /// Load ONNX model từ bytes (already checksum-verified by the bundle loader)
    pub fn from_bytes(name: &str, model_bytes: &[u8], layout: FeatureLayout, categories: Vec<String>) -> SohResult<Self> {
        log::info!("Loading ONNX model '{}' from memory ({} bytes)", name, model_bytes.len());

        let session = Session::builder()
            .map_err(|e| SohError::Inference(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| SohError::Inference(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| SohError::model_unavailable(name, format!("load from memory error: {}", e)))?;

        Ok(Self {
            name: name.to_string(),
            layout,
            categories,
            source: "<memory>".to_string(),
            session: Mutex::new(session),
        })
    }
}

/// Numeric block in layout order, then the one-hot chemistry block.
/// A chemistry outside `categories` encodes as all zeros.
pub fn encode_row(row: &FeatureRow, categories: &[String]) -> SohResult<Array2<f32>> {
    let width = row.values().len() + categories.len();
    let mut data = Vec::with_capacity(width);
    data.extend(row.values().iter().map(|&v| v as f32));
    data.extend(
        categories
            .iter()
            .map(|c| if c == row.battery_type() { 1.0f32 } else { 0.0 }),
    );

    Array2::<f32>::from_shape_vec((1, width), data)
        .map_err(|e| SohError::internal("onnx_encode", format!("Array error: {}", e)))
}

impl fmt::Debug for OnnxEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxEstimator")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("categories", &self.categories)
            .field("source", &self.source)
            .finish()
    }
}

impl Estimator for OnnxEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Onnx
    }

    fn layout(&self) -> FeatureLayout {
        self.layout
    }

    fn predict(&self, row: &FeatureRow) -> SohResult<f64> {
        ensure_layout(self, row)?;

        let start_time = std::time::Instant::now();
        let input_array = encode_row(row, &self.categories)?;

        let mut session = self.session.lock();

        let output_name = session.outputs.first()
            .map(|o| o.name.clone())
            .ok_or_else(|| SohError::Inference(format!("{}: no output defined", self.name)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| SohError::Inference(format!("Tensor error: {}", e)))?;

        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| SohError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs.get(&output_name)
            .ok_or_else(|| SohError::Inference(format!("{}: no output", self.name)))?;

        let output_tensor = output.try_extract_tensor::<f32>()
            .map_err(|e| SohError::Inference(format!("Extract error: {}", e)))?;

        let value = output_tensor.1.first()
            .copied()
            .ok_or_else(|| SohError::Inference(format!("{}: empty output tensor", self.name)))?;

        log::trace!(
            "ONNX '{}' predicted {} in {}us",
            self.name,
            value,
            start_time.elapsed().as_micros()
        );

        Ok(value as f64)
    }
}
