use super::shutdown::ShutdownTrigger;
use super::state::LoopStates;
use super::types::{IterationOutcome, LoopState, WorkerExit};
use crate::camera::CameraSource;
use crate::config::ThresholdMode;
use crate::display::DebugChannelRouter;
use crate::error::CaptureError;
use crate::params::{
    read_active_camera, read_detection_params, read_shutdown_requested, read_stream_quality,
    SharedParameterStore,
};
use crate::processor::{DetectionParams, FrameProcessor};
use crate::streaming::OutputSink;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Per-loop counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub iterations: u64,
    pub frames_processed: u64,
    pub frames_delivered: u64,
    pub capture_misses: u64,
    pub send_failures: u64,
    pub processing_errors: u64,
}

/// Settings a loop reads once at startup
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub threshold_mode: ThresholdMode,
    pub default_params: DetectionParams,
    pub default_quality: u8,
    pub capture_timeout: Duration,
}

/// Everything a loop shares with the other loops
#[derive(Clone)]
pub struct SharedOutputs {
    pub params: SharedParameterStore,
    pub sink: Arc<OutputSink>,
    pub router: DebugChannelRouter,
    pub shutdown: Arc<ShutdownTrigger>,
    pub states: LoopStates,
}

/// Capture, process and publish loop for one camera.
///
/// Every iteration polls the parameter store for the shutdown flag, the
/// active camera and the stream quality, then captures with a bounded wait.
/// Only the active camera's output reaches the sink and the debug windows;
/// the others keep capturing so switching is immediate.
pub struct CameraWorker {
    index: usize,
    camera: Box<dyn CameraSource>,
    processor: Box<dyn FrameProcessor>,
    settings: WorkerSettings,
    shared: SharedOutputs,
    stats: WorkerStats,
    state: LoopState,
}

impl CameraWorker {
    pub fn new(
        index: usize,
        camera: Box<dyn CameraSource>,
        processor: Box<dyn FrameProcessor>,
        settings: WorkerSettings,
        shared: SharedOutputs,
    ) -> Self {
        Self {
            index,
            camera,
            processor,
            settings,
            shared,
            stats: WorkerStats::default(),
            state: LoopState::Starting,
        }
    }

    pub fn name(&self) -> &str {
        self.camera.name()
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    async fn set_state(&mut self, state: LoopState) {
        self.state = state;
        let name = self.camera.name().to_string();
        self.shared.states.set(&name, state).await;
    }

    /// Run one capture/process/publish cycle
    pub async fn iterate(&mut self) -> IterationOutcome {
        if self.state == LoopState::Terminated {
            return IterationOutcome::Terminated;
        }
        self.stats.iterations += 1;

        let store = Arc::clone(&self.shared.params);
        let params = store.as_ref();
        if read_shutdown_requested(params) {
            info!("Shutdown requested via parameter store ({})", self.name());
            self.set_state(LoopState::ShuttingDown).await;
            self.shared.shutdown.fire().await;
            self.set_state(LoopState::Terminated).await;
            return IterationOutcome::ShutdownRequested;
        }

        let is_active = read_active_camera(params, 0) == self.index;
        if is_active {
            let quality = read_stream_quality(params, self.settings.default_quality);
            self.shared.sink.set_quality(quality);
        }

        let frame = match self.camera.capture(self.settings.capture_timeout).await {
            Ok(frame) => frame,
            Err(e) if !e.is_recoverable() => {
                error!("Camera {}: {}; stopping its capture loop", self.name(), e);
                self.set_state(LoopState::Terminated).await;
                return IterationOutcome::CameraClosed;
            }
            Err(e @ CaptureError::Timeout { .. }) => {
                debug!("Camera {}: {}", self.name(), e);
                self.stats.capture_misses += 1;
                self.set_state(LoopState::DegradedCapture).await;
                return IterationOutcome::Missed;
            }
            Err(e) => {
                warn!("Camera {} capture failed: {}", self.name(), e);
                self.stats.capture_misses += 1;
                self.set_state(LoopState::DegradedCapture).await;
                return IterationOutcome::Skipped;
            }
        };

        if self.state != LoopState::Running {
            self.set_state(LoopState::Running).await;
        }

        if self.settings.threshold_mode == ThresholdMode::Live {
            let detection = read_detection_params(params, &self.settings.default_params);
            self.processor.configure(&detection);
        }

        let frame_id = frame.id;
        let output = match self.processor.process(frame) {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    "{} failed on frame {} from {}: {}",
                    self.processor.name(),
                    frame_id,
                    self.name(),
                    e
                );
                self.stats.processing_errors += 1;
                return IterationOutcome::Skipped;
            }
        };
        self.stats.frames_processed += 1;

        if !is_active {
            trace!("Camera {} inactive; discarding frame {}", self.name(), frame_id);
            return IterationOutcome::Discarded;
        }

        if let Err(e) = self.shared.sink.display(output.main.clone()).await {
            warn!("Failed to display frame {}: {}", frame_id, e);
        }

        let outcome = match self.shared.sink.send(&output.main).await {
            Ok(()) => {
                self.stats.frames_delivered += 1;
                trace!(
                    "Delivered frame {} from {} ({} ms after capture)",
                    frame_id,
                    self.name(),
                    output.main.age_ms()
                );
                IterationOutcome::Delivered
            }
            Err(e) => {
                warn!("Failed to stream frame {} from {}: {}", frame_id, self.name(), e);
                self.stats.send_failures += 1;
                IterationOutcome::SendFailed
            }
        };

        for (channel, debug_frame) in output.debug {
            if let Err(e) = self.shared.router.route(&channel, debug_frame).await {
                warn!("Failed to show debug channel '{}': {}", channel, e);
            }
        }

        outcome
    }

    /// Loop until cancelled, the camera closes or shutdown is requested
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerExit {
        info!(
            "Capture loop for {} started (camera index {})",
            self.name(),
            self.index
        );
        self.set_state(LoopState::Running).await;

        let exit = loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break WorkerExit::Cancelled,
                outcome = self.iterate() => outcome,
            };

            match outcome {
                IterationOutcome::ShutdownRequested => break WorkerExit::ShutdownRequested,
                IterationOutcome::CameraClosed | IterationOutcome::Terminated => {
                    break WorkerExit::CameraClosed
                }
                _ => {}
            }
        };

        if exit == WorkerExit::Cancelled {
            self.set_state(LoopState::ShuttingDown).await;
        }
        self.camera.close().await;
        self.set_state(LoopState::Terminated).await;

        info!(
            "Capture loop for {} stopped ({:?}): {:?}",
            self.name(),
            exit,
            self.stats
        );
        exit
    }
}
