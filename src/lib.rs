pub mod detection;
pub mod error;
pub mod models;
pub mod params;
pub mod pipeline;

pub use detection::{build_standard_pipeline, run, VehicleDetector};
pub use error::DetectionError;
pub use models::{BoundingBox, Classification, Component};
pub use params::{DetectionParams, ParamOverrides};
pub use pipeline::{
    MetadataValue, ParameterMode, Pipeline, PipelineContext, PipelineData, PipelineOutput,
    PipelineStep, Snapshot,
};
