/// Errors surfaced to callers of the detection pipeline.
///
/// Failures inside a stage never reach the caller: the pipeline turns them
/// into a single-step output instead (see [`crate::Pipeline::run`]).
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// The input raster was empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
