#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from carcount for tests
#[allow(unused_imports)]
pub use carcount::{
    BoundingBox, Classification, Component, DetectionParams, ParamOverrides, Pipeline,
    PipelineOutput,
};
