//! Stage 2 - raw degradation prediction

use super::latent::finite;
use crate::error::SohResult;
use crate::logic::features::{FeatureSet, LatentFeatureVector, VehicleInput};
use crate::logic::model::{ModelBundle, ModelRole};

#[derive(Debug, Clone, Copy)]
pub struct DegradationStage<'a> {
    bundle: &'a ModelBundle,
}

impl<'a> DegradationStage<'a> {
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self { bundle }
    }

    /// Column order comes from `Stage2Features`, never from the caller
    pub fn predict_degradation(&self, input: &VehicleInput, latent: LatentFeatureVector) -> SohResult<f64> {
        let estimator = self.bundle.get(ModelRole::Stage2)?;
        let row = input.stage2(latent).to_row();

        let raw = finite("degradation", estimator, estimator.predict(&row)?)?;
        log::debug!("Stage 2 {:?} -> {:.4}", row.to_log_entry(), raw);
        Ok(raw)
    }
}
