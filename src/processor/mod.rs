mod color;
mod interface;
mod passthrough;
mod types;

pub use color::{Blob, ColorThresholdProcessor, THRESHOLD_CHANNEL};
pub use interface::{create_processor, FrameProcessor};
pub use passthrough::PassthroughProcessor;
pub use types::{DetectionParams, ProcessedOutput, ThresholdRange, CHANNEL_MAX, CHANNEL_MIN};
