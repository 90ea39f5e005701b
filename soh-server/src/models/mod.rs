//! Data models

pub mod prediction;
pub mod vehicle;

pub use prediction::*;
pub use vehicle::*;
