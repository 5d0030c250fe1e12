use super::interface::FrameProcessor;
use super::types::{DetectionParams, ProcessedOutput};
use crate::error::ProcessingError;
use crate::frame::FrameData;

/// Publishes captured frames unchanged
#[derive(Debug, Default)]
pub struct PassthroughProcessor;

impl FrameProcessor for PassthroughProcessor {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn configure(&mut self, _params: &DetectionParams) {}

    fn process(&mut self, frame: FrameData) -> Result<ProcessedOutput, ProcessingError> {
        Ok(ProcessedOutput::new(frame))
    }
}
