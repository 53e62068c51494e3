pub mod annotate;
pub mod classify;
pub mod contours;
pub mod morphology;
pub mod preprocessing;
pub mod steps;
pub mod threshold;

use image::DynamicImage;
use std::sync::Arc;

use crate::error::DetectionError;
use crate::models::{Classification, Component};
use crate::params::{DetectionParams, ParamOverrides};
use crate::pipeline::{ParameterMode, Pipeline, PipelineOutput};

/// Build the standard vehicle counting pipeline for a resolved parameter set
pub fn build_standard_pipeline(params: &DetectionParams, mode: ParameterMode) -> Pipeline {
    use steps::*;

    Pipeline::new()
        .with_mode(mode)
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(SmoothingStep))
        .add_step(Arc::new(ThresholdStep {
            block_size: params.block_size,
            c_value: params.c_value,
        }))
        .add_step(Arc::new(OpeningStep {
            kernel: params.open_kernel,
            iterations: params.open_iterations,
        }))
        .add_step(Arc::new(ClosingStep {
            kernel_w: params.close_kernel_w,
            kernel_h: params.close_kernel_h,
        }))
        .add_step(Arc::new(LabelingStep))
        .add_step(Arc::new(ClassificationStep { params: *params }))
        .add_step(Arc::new(AnnotationStep))
}

/// Count vehicles in one image.
///
/// Overrides are merged onto the defaults and clamped. Returns an error only
/// for an empty image; failures inside the pipeline produce a single-step
/// output holding the original image.
pub fn run(
    image: &DynamicImage,
    overrides: Option<&ParamOverrides>,
) -> Result<PipelineOutput, DetectionError> {
    VehicleDetector::from_overrides(overrides).detect(image)
}

/// Vehicle detector bound to one resolved parameter set
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleDetector {
    pub params: DetectionParams,
    pub mode: ParameterMode,
}

impl VehicleDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            params,
            mode: ParameterMode::Automatic,
        }
    }

    /// Resolve overrides onto the defaults; supplying any makes the run manual
    pub fn from_overrides(overrides: Option<&ParamOverrides>) -> Self {
        Self {
            params: DetectionParams::resolve(overrides),
            mode: if overrides.is_some() {
                ParameterMode::Manual
            } else {
                ParameterMode::Automatic
            },
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        build_standard_pipeline(&self.params, self.mode)
    }

    /// Run the full detection pipeline on an image
    pub fn detect(&self, img: &DynamicImage) -> Result<PipelineOutput, DetectionError> {
        tracing::debug!(
            width = img.width(),
            height = img.height(),
            mode = self.mode.as_str(),
            "running vehicle detection"
        );
        self.pipeline().run(img)
    }

    /// Classified components of an image (for debugging)
    pub fn classify_components(
        &self,
        img: &DynamicImage,
    ) -> anyhow::Result<Vec<(Component, Classification)>> {
        let output = self.pipeline().try_run(img)?;
        Ok(output
            .components
            .into_iter()
            .zip(output.classifications)
            .collect())
    }
}
