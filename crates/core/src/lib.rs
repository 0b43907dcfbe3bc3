//! StepSight core domain logic.
//!
//! Everything HTTP-free lives here: the image decoder, the statistical
//! feature extractor, the rule-based risk scorer, and the in-memory
//! submission store. The `stepsight-api` crate wires these into axum
//! handlers.

pub mod capabilities;
pub mod error;
pub mod features;
pub mod imaging;
pub mod scoring;
pub mod submission;
