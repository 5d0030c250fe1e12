use super::backend::{DisplayBackend, DisplayWindow};
use crate::error::DisplayError;
use crate::frame::{FrameData, FrameFormat};
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSrc;
use gstreamer_video::{VideoFormat, VideoInfo};
use tracing::{debug, info, warn};

/// Windows backed by `appsrc ! videoconvert ! autovideosink` pipelines
pub struct GstWindowBackend;

impl GstWindowBackend {
    pub fn new() -> Result<Self, DisplayError> {
        gstreamer::init().map_err(|e| DisplayError::WindowCreate {
            name: "gstreamer".to_string(),
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;
        Ok(Self)
    }
}

impl DisplayBackend for GstWindowBackend {
    fn create_window(&mut self, name: &str) -> Result<Box<dyn DisplayWindow>, DisplayError> {
        let create_error = |details: String| DisplayError::WindowCreate {
            name: name.to_string(),
            details,
        };

        let pipeline_desc = "appsrc name=src is-live=true format=time do-timestamp=true ! \
             queue max-size-buffers=1 leaky=downstream ! \
             videoconvert ! autovideosink sync=false";

        debug!("Creating window pipeline for '{}': {}", name, pipeline_desc);

        let pipeline = gstreamer::parse::launch(pipeline_desc)
            .map_err(|e| create_error(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| create_error("Failed to downcast to Pipeline".to_string()))?;

        let appsrc = pipeline
            .by_name("src")
            .and_then(|element| element.downcast::<AppSrc>().ok())
            .ok_or_else(|| create_error("appsrc missing from pipeline".to_string()))?;

        appsrc.set_property("block", false);

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| create_error(format!("Failed to start pipeline: {}", e)))?;

        info!("Window '{}' opened", name);
        Ok(Box::new(GstWindow {
            name: name.to_string(),
            pipeline,
            appsrc,
            layout: None,
        }))
    }
}

struct GstWindow {
    name: String,
    pipeline: Pipeline,
    appsrc: AppSrc,
    layout: Option<(FrameFormat, u32, u32, usize)>,
}

impl GstWindow {
    fn render_error(&self, details: String) -> DisplayError {
        DisplayError::Render {
            name: self.name.clone(),
            details,
        }
    }

    /// Update appsrc caps when the frame geometry changes; returns the row stride
    fn apply_layout(&mut self, frame: &FrameData) -> Result<usize, DisplayError> {
        if let Some((format, width, height, stride)) = self.layout {
            if (format, width, height) == (frame.format, frame.width, frame.height) {
                return Ok(stride);
            }
        }

        let video_format = match frame.format {
            FrameFormat::Rgb24 => VideoFormat::Rgb,
            FrameFormat::Gray8 => VideoFormat::Gray8,
            FrameFormat::Mjpeg => {
                return Err(self.render_error("compressed frames cannot be shown".to_string()))
            }
        };

        let info = VideoInfo::builder(video_format, frame.width, frame.height)
            .build()
            .map_err(|e| self.render_error(format!("Invalid video info: {}", e)))?;
        let caps = info
            .to_caps()
            .map_err(|e| self.render_error(format!("Invalid caps: {}", e)))?;
        self.appsrc.set_caps(Some(&caps));

        let stride = info.stride()[0] as usize;
        self.layout = Some((frame.format, frame.width, frame.height, stride));
        debug!(
            "Window '{}' layout {:?} {}x{}",
            self.name, frame.format, frame.width, frame.height
        );
        Ok(stride)
    }
}

impl DisplayWindow for GstWindow {
    fn show(&mut self, frame: &FrameData) -> Result<(), DisplayError> {
        if !frame.validate_size() {
            return Err(self.render_error(format!("frame {} has the wrong size", frame.id)));
        }

        let stride = self.apply_layout(frame)?;
        let row = frame.width as usize * frame.format.bytes_per_pixel();

        let data = if stride == row {
            frame.data.as_ref().clone()
        } else {
            let mut padded = vec![0u8; stride * frame.height as usize];
            for (source, target) in frame.data.chunks(row).zip(padded.chunks_mut(stride)) {
                target[..row].copy_from_slice(source);
            }
            padded
        };

        self.appsrc
            .push_buffer(gstreamer::Buffer::from_mut_slice(data))
            .map_err(|e| self.render_error(format!("Failed to push buffer: {:?}", e)))?;
        Ok(())
    }
}

impl Drop for GstWindow {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to close window '{}': {}", self.name, e);
        }
    }
}
