use crate::detection::{annotate, classify, contours, morphology, preprocessing, threshold};
use crate::detection::morphology::{StructuringElement, DIAGONAL_CLOSE, VERTICAL_CLOSE};
use crate::params::DetectionParams;
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};
use anyhow::{bail, Result};
use image::{DynamicImage, GrayImage};

/// Borrow the working raster as single-channel, rejecting anything else
fn expect_luma<'a>(data: &'a PipelineData, step: &str) -> Result<&'a GrayImage> {
    match &data.image {
        DynamicImage::ImageLuma8(gray) => Ok(gray),
        other => bail!(
            "{} expects a single-channel raster, got {:?}",
            step,
            other.color()
        ),
    }
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = preprocessing::to_grayscale(&data.image);
        data.image = DynamicImage::ImageLuma8(gray);
        data.description = "Grayscale conversion to simplify processing".to_string();
        Ok(data)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Bilateral filter followed by a small Gaussian blur
pub struct SmoothingStep;

impl PipelineStep for SmoothingStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let smoothed = preprocessing::smooth(expect_luma(&data, self.name())?);
        data.image = DynamicImage::ImageLuma8(smoothed);
        data.description = format!(
            "Smoothing: bilateral (d={}, sigma={}) + Gaussian {}x{} preserving vehicle detail",
            preprocessing::BILATERAL_DIAMETER,
            preprocessing::BILATERAL_SIGMA_COLOR,
            preprocessing::GAUSSIAN_TAPS,
            preprocessing::GAUSSIAN_TAPS,
        );
        Ok(data)
    }

    fn name(&self) -> &str {
        "Smoothing"
    }
}

/// Adaptive mean threshold with polarity correction
pub struct ThresholdStep {
    pub block_size: u32,
    pub c_value: u32,
}

impl PipelineStep for ThresholdStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = expect_luma(&data, self.name())?;
        let binary = threshold::adaptive_threshold_mean(gray, self.block_size, self.c_value);
        let polarity = threshold::correct_polarity(binary);

        data.description = format!(
            "Adaptive mean threshold {} inversion - Block:{}, C:{} (ratio: {:.2})",
            if polarity.inverted { "with" } else { "without" },
            self.block_size,
            self.c_value,
            polarity.foreground_ratio,
        );
        data.image = DynamicImage::ImageLuma8(polarity.binary);
        data.metadata.insert(
            "foreground_ratio".to_string(),
            MetadataValue::Float(polarity.foreground_ratio),
        );
        data.metadata.insert("inverted".to_string(), MetadataValue::Bool(polarity.inverted));
        Ok(data)
    }

    fn name(&self) -> &str {
        "Adaptive Threshold"
    }
}

/// Remove small specks with an elliptical opening
pub struct OpeningStep {
    pub kernel: u32,
    pub iterations: u32,
}

impl PipelineStep for OpeningStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let element = StructuringElement::ellipse(self.kernel, self.kernel);
        let opened = morphology::open(expect_luma(&data, self.name())?, &element, self.iterations);
        data.image = DynamicImage::ImageLuma8(opened);
        data.description = format!(
            "Morphological opening - Elliptical kernel:{}x{}, Iter:{}",
            self.kernel, self.kernel, self.iterations
        );
        Ok(data)
    }

    fn name(&self) -> &str {
        "Opening"
    }
}

/// Horizontal, vertical and diagonal closing to merge object fragments
pub struct ClosingStep {
    pub kernel_w: u32,
    pub kernel_h: u32,
}

impl PipelineStep for ClosingStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let closed = morphology::close_fragments(
            expect_luma(&data, self.name())?,
            self.kernel_w,
            self.kernel_h,
        );
        data.image = DynamicImage::ImageLuma8(closed);
        data.description = format!(
            "Morphological closing - Horizontal:{}x{}, Vertical:{}x{}, Diagonal:{}x{}",
            self.kernel_w,
            self.kernel_h,
            VERTICAL_CLOSE.0,
            VERTICAL_CLOSE.1,
            DIAGONAL_CLOSE.0,
            DIAGONAL_CLOSE.1,
        );
        Ok(data)
    }

    fn name(&self) -> &str {
        "Closing"
    }
}

/// Label connected components and measure them
pub struct LabelingStep;

impl PipelineStep for LabelingStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let labeling = contours::find_components(expect_luma(&data, self.name())?);
        let count = labeling.count();

        data.snapshot = Some(DynamicImage::ImageRgb8(contours::visualize_labels(
            &labeling.labels,
        )));
        data.description = format!("Connected component labeling: {} components found", count);
        data.metadata
            .insert("component_count".to_string(), MetadataValue::Int(count as i64));
        data.components = labeling.components;
        data.classifications.clear();
        Ok(data)
    }

    fn name(&self) -> &str {
        "Component Labeling"
    }
}

/// Run the geometric decision list over every component
pub struct ClassificationStep {
    pub params: DetectionParams,
}

impl PipelineStep for ClassificationStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let p = &self.params;
        data.classifications = classify::classify_all(&data.components, p);
        let vehicles = classify::count_vehicles(&data.classifications);

        for (component, class) in data.components.iter().zip(&data.classifications) {
            tracing::trace!(
                label = component.label,
                class = class.as_str(),
                width = component.width(),
                height = component.height(),
                area = component.area,
                aspect = component.aspect_ratio(),
                extent = component.extent(),
                compactness = component.compactness(),
                "classified component"
            );
        }

        let original = data.original.to_rgb8();
        data.snapshot = Some(DynamicImage::ImageRgb8(annotate::draw_component_stats(
            &original,
            &data.components,
            &data.classifications,
        )));
        data.description = format!(
            "Geometric filtering: {} vehicles of {} components - Area:[{}-{}], Aspect:[{:.1}-{:.1}], Width:[{}-{}]",
            vehicles,
            data.components.len(),
            p.min_area,
            p.max_area,
            p.min_aspect,
            p.max_aspect,
            p.min_width,
            p.max_width,
        );
        Ok(data)
    }

    fn name(&self) -> &str {
        "Classification"
    }
}

/// Draw the accepted vehicles on the original image
pub struct AnnotationStep;

impl PipelineStep for AnnotationStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        if data.classifications.len() != data.components.len() {
            bail!(
                "{} components but {} classifications",
                data.components.len(),
                data.classifications.len()
            );
        }
        let vehicles = classify::count_vehicles(&data.classifications);
        let original = data.original.to_rgb8();
        let result = annotate::draw_vehicles(&original, &data.components, &data.classifications);

        data.image = DynamicImage::ImageRgb8(result);
        data.description = format!(
            "Final result: {} vehicles detected in {} mode",
            vehicles,
            context.mode.as_str()
        );
        Ok(data)
    }

    fn name(&self) -> &str {
        "Annotation"
    }
}
