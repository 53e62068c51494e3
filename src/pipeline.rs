use anyhow::Result;
use image::DynamicImage;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::error::DetectionError;
use crate::models::{Classification, Component};

/// Data that flows through the pipeline
#[derive(Clone)]
pub struct PipelineData {
    /// Working raster consumed by the next step
    pub image: DynamicImage,

    /// Reference to the original image (shared efficiently via Arc)
    pub original: Arc<DynamicImage>,

    /// Image to display for the step just run, when it differs from `image`
    pub snapshot: Option<DynamicImage>,

    /// Human-readable description of the step just run
    pub description: String,

    /// Components found by labelling (empty before that step)
    pub components: Vec<Component>,

    /// One label per component once classified
    pub classifications: Vec<Classification>,

    /// Metadata for tracking properties (e.g., "foreground_ratio", "inverted", etc.)
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Float(f64),
    String(String),
    Int(i64),
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            snapshot: None,
            description: String::new(),
            components: Vec::new(),
            classifications: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get metadata as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as float
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as int
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Record the step just run, clearing the per-step display fields
    fn take_snapshot(&mut self, name: &str) -> Snapshot {
        let image = self.snapshot.take().unwrap_or_else(|| self.image.clone());
        Snapshot {
            name: name.to_string(),
            image,
            description: std::mem::take(&mut self.description),
        }
    }
}

/// How the parameter set of a run was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    #[default]
    Automatic,
    Manual,
}

impl ParameterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterMode::Automatic => "automatic",
            ParameterMode::Manual => "manual",
        }
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub mode: ParameterMode,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Transform the data and describe what was done in `description`
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug output)
    fn name(&self) -> &str;
}

/// One displayable stage result
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Name of the step that produced it
    pub name: String,
    pub image: DynamicImage,
    pub description: String,
}

/// Name of the snapshot holding the unmodified input
pub const ORIGINAL_STEP: &str = "Original";

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Original image first, final annotated result last
    pub steps: Vec<Snapshot>,
    pub vehicle_count: usize,
    pub components: Vec<Component>,
    pub classifications: Vec<Classification>,
    pub metadata: HashMap<String, MetadataValue>,
}

impl PipelineOutput {
    /// Single-step output returned when a stage fails
    fn degenerate(original: DynamicImage, message: &str) -> Self {
        Self {
            steps: vec![Snapshot {
                name: ORIGINAL_STEP.to_string(),
                image: original,
                description: format!("processing error: {}", message),
            }],
            vehicle_count: 0,
            components: Vec::new(),
            classifications: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.description.clone()).collect()
    }

    pub fn images(&self) -> Vec<&DynamicImage> {
        self.steps.iter().map(|s| &s.image).collect()
    }

    /// Last snapshot (the annotated result on success)
    pub fn final_image(&self) -> Option<&DynamicImage> {
        self.steps.last().map(|s| &s.image)
    }

    /// Whether the run failed and only the original image is available
    pub fn is_degenerate(&self) -> bool {
        self.steps.len() == 1
            && self
                .steps
                .first()
                .is_some_and(|s| s.description.starts_with("processing error:"))
    }

    /// Split into (images, vehicle count, descriptions)
    pub fn into_parts(self) -> (Vec<DynamicImage>, usize, Vec<String>) {
        let (images, descriptions) = self
            .steps
            .into_iter()
            .map(|s| (s.image, s.description))
            .unzip();
        (images, self.vehicle_count, descriptions)
    }
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Set how the parameters were chosen (shown in step descriptions)
    pub fn with_mode(mut self, mode: ParameterMode) -> Self {
        self.context.mode = mode;
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step on `input`.
    ///
    /// Empty input is rejected before any step runs. Any failure inside a
    /// step, including a panic, yields a single-step output holding the
    /// original image and the failure message, never an error.
    pub fn run(&self, input: &DynamicImage) -> std::result::Result<PipelineOutput, DetectionError> {
        validate_input(input)?;

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.execute(input, self.steps.len())));
        let message = match attempt {
            Ok(Ok(output)) => return Ok(output),
            Ok(Err(e)) => format!("{:#}", e),
            Err(payload) => panic_message(payload.as_ref()),
        };

        tracing::warn!(error = %message, "pipeline failed, returning original image");
        Ok(PipelineOutput::degenerate(input.clone(), &message))
    }

    /// Run without error recovery, propagating the first step failure
    pub fn try_run(&self, input: &DynamicImage) -> Result<PipelineOutput> {
        validate_input(input)?;
        self.execute(input, self.steps.len())
    }

    /// Run the pipeline but stop at an intermediate step (useful for debugging)
    pub fn run_partial(&self, input: &DynamicImage, num_steps: usize) -> Result<PipelineOutput> {
        validate_input(input)?;
        self.execute(input, num_steps)
    }

    fn execute(&self, input: &DynamicImage, num_steps: usize) -> Result<PipelineOutput> {
        let mut data = PipelineData::from_image(input.clone());
        data.description = format!(
            "Original image loaded for analysis - Mode: {}",
            self.context.mode.as_str().to_uppercase()
        );
        let mut steps = vec![data.take_snapshot(ORIGINAL_STEP)];

        for step in self.steps.iter().take(num_steps) {
            let started = Instant::now();
            data = step.process(data, &self.context)?;
            let snapshot = data.take_snapshot(step.name());

            tracing::debug!(
                step = step.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                components = data.components.len(),
                "{}",
                snapshot.description
            );
            steps.push(snapshot);
        }

        let vehicle_count = data.classifications.iter().filter(|c| c.is_vehicle()).count();
        tracing::info!(vehicles = vehicle_count, components = data.components.len(), "pipeline finished");

        Ok(PipelineOutput {
            steps,
            vehicle_count,
            components: data.components,
            classifications: data.classifications,
            metadata: data.metadata,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_input(input: &DynamicImage) -> std::result::Result<(), DetectionError> {
    if input.width() == 0 || input.height() == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "input image is empty ({}x{})",
            input.width(),
            input.height()
        )));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
