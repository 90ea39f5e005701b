//! Features Module - Estimator Input Schema
//!
//! Typed feature structs for both cascade stages plus the versioned layout
//! that estimator artifacts are checked against.

pub mod layout;
pub mod vector;

// Re-export common types
pub use layout::{FeatureLayout, LayoutInfo, LayoutMismatchError, FEATURE_VERSION};
pub use vector::{
    FeatureRow, FeatureSet, LatentFeatureVector, Stage1Features, Stage2Features, VehicleInput,
};
