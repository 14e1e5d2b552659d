pub mod artifact_check;
pub mod image_service;
pub mod model_loader;
pub mod prediction_runner;
pub mod scoring;

pub use artifact_check::{ArtifactChecker, ArtifactReport, ModelMetadata};
pub use model_loader::{LoadPolicy, ModelLoader};
pub use prediction_runner::predict;
