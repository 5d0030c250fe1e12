use super::types::LoopState;
use super::worker::{CameraWorker, SharedOutputs, WorkerSettings};
use super::VisionOrchestrator;
use crate::camera::open_camera;
use crate::display::{
    default_backend, display_available, DebugChannelRouter, DisplayContext, MAIN_WINDOW,
};
use crate::error::{DisplayError, Result};
use crate::processor::{create_processor, DetectionParams};
use crate::streaming::{MjpegBroadcaster, OutputSink, VideoServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

impl VisionOrchestrator {
    /// Bring up the display, open every camera and bind the video server.
    ///
    /// Failures map to distinct exit codes: headless with a required display,
    /// camera open, then video server bind, checked in that order.
    pub async fn start(&mut self) -> Result<()> {
        info!(
            "Starting vision pipeline with {} camera(s)",
            self.config.cameras.len()
        );

        self.display = self.start_display().await?;

        let mut opened = Vec::with_capacity(self.config.cameras.len());
        for camera_config in &self.config.cameras {
            self.states
                .set(&camera_config.name, LoopState::Starting)
                .await;

            match open_camera(camera_config).await {
                Ok(camera) => {
                    info!("Camera {} opened", camera_config.name);
                    opened.push((camera, camera_config.capture_timeout_ms));
                }
                Err(e) => {
                    error!("Failed to open camera {}: {}", camera_config.name, e);
                    self.states
                        .set(&camera_config.name, LoopState::Terminated)
                        .await;
                    return Err(e.into());
                }
            }
        }

        let (broadcaster, feed) = MjpegBroadcaster::channel();
        let remote_params = self
            .config
            .parameters
            .remote_api
            .then(|| Arc::clone(&self.params));

        let server = VideoServer::bind(
            &self.config.stream,
            feed,
            Arc::clone(&self.counters),
            remote_params,
        )
        .await
        .map_err(|e| {
            error!("Failed to start video server: {}", e);
            e
        })?;
        self.stream_address = Some(server.local_addr());
        self.server = Some(server);

        let shared = SharedOutputs {
            params: Arc::clone(&self.params),
            sink: Arc::new(OutputSink::new(
                Box::new(broadcaster),
                self.display.clone(),
                self.config.stream.quality,
                Arc::clone(&self.counters),
            )),
            router: DebugChannelRouter::new(self.display.clone()),
            shutdown: Arc::clone(&self.shutdown),
            states: self.states.clone(),
        };
        let default_params = DetectionParams::from_config(&self.config.processor);

        for (index, (camera, timeout_ms)) in opened.into_iter().enumerate() {
            let settings = WorkerSettings {
                threshold_mode: self.config.processor.threshold_mode,
                default_params,
                default_quality: self.config.stream.quality,
                capture_timeout: Duration::from_millis(timeout_ms),
            };
            self.workers.push(CameraWorker::new(
                index,
                camera,
                create_processor(&self.config.processor),
                settings,
                shared.clone(),
            ));
        }

        info!("Vision pipeline started");
        Ok(())
    }

    async fn start_display(&mut self) -> Result<Option<DisplayContext>> {
        let required = self.config.display.require_display;

        if !display_available(self.config.display.mode) {
            if required {
                error!("A display is required but none is available");
                return Err(DisplayError::Headless.into());
            }
            info!("No display available; running headless");
            return Ok(None);
        }

        let backend = match self.display_backend.take() {
            Some(backend) => backend,
            None => match default_backend() {
                Ok(backend) => backend,
                Err(e) if required => return Err(e.into()),
                Err(e) => {
                    warn!("Display unavailable ({}); running headless", e);
                    return Ok(None);
                }
            },
        };

        let context = DisplayContext::spawn(backend)?;
        if let Err(e) = context.open(MAIN_WINDOW).await {
            if required {
                context.stop();
                return Err(e.into());
            }
            warn!("Failed to open main window: {}", e);
        }

        Ok(Some(context))
    }
}
