use super::color::ColorThresholdProcessor;
use super::passthrough::PassthroughProcessor;
use super::types::{DetectionParams, ProcessedOutput};
use crate::config::{ProcessorConfig, ProcessorKind};
use crate::error::ProcessingError;
use crate::frame::FrameData;

/// A pluggable detection strategy.
///
/// Each call yields exactly one main frame plus any number of named debug
/// frames. Debug names must be stable across calls so they keep routing to
/// the same debug window, but a processor may omit any of them on a given
/// frame. Processors never read the parameter store themselves; the capture
/// loop hands them fresh [`DetectionParams`] through [`configure`].
///
/// [`configure`]: FrameProcessor::configure
pub trait FrameProcessor: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Replace the detection parameters used by subsequent calls
    fn configure(&mut self, params: &DetectionParams);

    /// Process one captured frame
    fn process(&mut self, frame: FrameData) -> Result<ProcessedOutput, ProcessingError>;
}

/// Build the processor selected in the configuration
pub fn create_processor(config: &ProcessorConfig) -> Box<dyn FrameProcessor> {
    let params = DetectionParams::from_config(config);

    match config.kind {
        ProcessorKind::ColorThreshold => Box::new(ColorThresholdProcessor::new(params)),
        ProcessorKind::Passthrough => Box::new(PassthroughProcessor),
    }
}
