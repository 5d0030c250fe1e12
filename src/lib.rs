pub mod app;
pub mod camera;
pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod params;
pub mod processor;
pub mod streaming;

pub use app::{LoopState, ShutdownReason, VisionOrchestrator};
pub use camera::{open_camera, CameraSource};
pub use config::VisionConfig;
pub use display::{DebugChannelRouter, DisplayContext};
pub use error::{exit_code, Result, VisionError};
pub use frame::{FrameData, FrameFormat};
pub use params::{MemoryParameterStore, ParameterStore, SharedParameterStore};
pub use processor::{create_processor, FrameProcessor, ProcessedOutput};
pub use streaming::{OutputSink, StreamStats, VideoServer};
