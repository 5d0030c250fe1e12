use super::source::CameraSource;
use crate::error::{CameraError, CaptureError};
use crate::frame::{pack_rows, FrameData, FrameFormat};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// V4L2 capture through GStreamer, converted to packed RGB
pub struct GstCamera {
    name: String,
    index: u32,
    fps: u32,
    resolution: (u32, u32),
    pipeline: Option<Pipeline>,
    samples: Option<mpsc::Receiver<gstreamer::Sample>>,
    next_id: u64,
    closed: bool,
}

impl GstCamera {
    pub fn new(name: &str, index: u32, fps: u32) -> Result<Self, CameraError> {
        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        Ok(Self {
            name: name.to_string(),
            index,
            fps: fps.max(1),
            resolution: (640, 480),
            pipeline: None,
            samples: None,
            next_id: 0,
            closed: false,
        })
    }

    fn caps_string(&self) -> String {
        format!(
            "video/x-raw,format=RGB,width={},height={},framerate={}/1",
            self.resolution.0, self.resolution.1, self.fps
        )
    }

    fn build_pipeline_string(&self) -> String {
        format!(
            "v4l2src device=/dev/video{} do-timestamp=true ! \
             videoconvert ! videoscale ! capsfilter name=caps caps={} ! \
             appsink name=sink sync=false max-buffers=2 drop=true enable-last-sample=false",
            self.index,
            self.caps_string()
        )
    }

    fn device_error(&self, details: String) -> CameraError {
        CameraError::DeviceOpen {
            device: format!("/dev/video{}", self.index),
            details,
        }
    }

    fn sample_to_frame(&mut self, sample: gstreamer::Sample) -> Result<FrameData, CaptureError> {
        let buffer = sample.buffer().ok_or_else(|| CaptureError::Stream {
            details: "No buffer in sample".to_string(),
        })?;
        let caps = sample.caps().ok_or_else(|| CaptureError::Stream {
            details: "No caps in sample".to_string(),
        })?;
        let info = VideoInfo::from_caps(caps).map_err(|e| CaptureError::Stream {
            details: format!("Failed to get video info: {}", e),
        })?;
        let map = buffer.map_readable().map_err(|e| CaptureError::Stream {
            details: format!("Failed to map buffer: {}", e),
        })?;

        let width = info.width();
        let height = info.height();
        let row = width as usize * 3;
        let stride = info.stride()[0] as usize;
        let bytes = map.as_slice();

        let data = pack_rows(bytes, row, stride, height as usize).ok_or_else(|| {
            CaptureError::Stream {
                details: format!(
                    "Short buffer: {} bytes for {}x{} with stride {}",
                    bytes.len(),
                    width,
                    height,
                    stride
                ),
            }
        })?;

        let id = self.next_id;
        self.next_id += 1;

        trace!(
            "Camera {} frame {} ({}x{}, {} bytes)",
            self.name,
            id,
            width,
            height,
            data.len()
        );

        Ok(FrameData::new(
            id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgb24,
        ))
    }
}

#[async_trait]
impl CameraSource for GstCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        self.resolution = (width, height);

        if let Some(pipeline) = &self.pipeline {
            let caps_filter = pipeline
                .by_name("caps")
                .ok_or_else(|| CameraError::Configuration {
                    details: "capsfilter missing from pipeline".to_string(),
                })?;
            let caps = self
                .caps_string()
                .parse::<gstreamer::Caps>()
                .map_err(|e| CameraError::Configuration {
                    details: format!("Invalid caps: {}", e),
                })?;
            caps_filter.set_property("caps", &caps);
        }

        debug!("Camera {} resolution {}x{}", self.name, width, height);
        Ok(())
    }

    async fn start(&mut self) -> Result<(), CameraError> {
        if self.pipeline.is_some() {
            warn!("Camera {} is already started", self.name);
            return Ok(());
        }

        let pipeline_desc = self.build_pipeline_string();
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| CameraError::Configuration {
                details: "appsink missing from pipeline".to_string(),
            })?;

        let (tx, rx) = mpsc::channel(2);
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    // Full means the loop is behind; it only wants the newest frame
                    let _ = tx.try_send(sample);
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| self.device_error(format!("Failed to start pipeline: {}", e)))?;

        let (result, _, _) = pipeline.state(gstreamer::ClockTime::from_seconds(5));
        if let Err(e) = result {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(self.device_error(format!("Device did not start: {}", e)));
        }

        info!("Camera {} pipeline started", self.name);
        self.pipeline = Some(pipeline);
        self.samples = Some(rx);
        self.closed = false;
        Ok(())
    }

    async fn capture(&mut self, timeout: Duration) -> Result<FrameData, CaptureError> {
        if self.closed {
            return Err(CaptureError::Closed);
        }

        let samples = self.samples.as_mut().ok_or_else(|| CaptureError::Stream {
            details: "capture before start".to_string(),
        })?;

        let mut sample = match tokio::time::timeout(timeout, samples.recv()).await {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                error!("Camera {} sample channel closed", self.name);
                return Err(CaptureError::Closed);
            }
            Err(_) => {
                return Err(CaptureError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        while let Ok(newer) = samples.try_recv() {
            sample = newer;
        }

        self.sample_to_frame(sample)
    }

    async fn close(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                warn!("Failed to stop camera {} pipeline: {}", self.name, e);
            }
            info!("Camera {} closed", self.name);
        }
        self.samples = None;
        self.closed = true;
    }
}

impl Drop for GstCamera {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            let _ = pipeline.set_state(gstreamer::State::Null);
        }
    }
}
