use super::*;
use crate::camera::CameraSource;
use crate::config::{
    CameraConfig, CameraSourceKind, DisplayMode, ThresholdMode, VisionConfig,
};
use crate::display::{DebugChannelRouter, DisplayBackend, DisplayWindow, MAIN_WINDOW};
use crate::error::{exit_code, CameraError, CaptureError, DisplayError, ProcessingError, ShutdownError, StreamError};
use crate::frame::{FrameData, FrameFormat};
use crate::params::{
    MemoryParameterStore, ParameterStore, SharedParameterStore, ACTIVE_CAMERA_KEY, H_MIN_KEY,
    SHUTDOWN_KEY, STREAM_QUALITY_KEY,
};
use crate::processor::{DetectionParams, FrameProcessor, ProcessedOutput, ThresholdRange};
use crate::streaming::{OutputSink, StreamCounters, VideoStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

fn test_frame(id: u64) -> FrameData {
    FrameData::new(id, SystemTime::now(), vec![0u8; 4 * 4 * 3], 4, 4, FrameFormat::Rgb24)
}

/// Replays a fixed sequence of capture results, then repeats `exhausted`
struct ScriptedCamera {
    name: String,
    script: VecDeque<Result<FrameData, CaptureError>>,
    exhausted: CaptureError,
    captures: Arc<AtomicUsize>,
}

impl ScriptedCamera {
    fn new(name: &str, script: Vec<Result<FrameData, CaptureError>>, exhausted: CaptureError) -> Self {
        Self {
            name: name.to_string(),
            script: script.into(),
            exhausted,
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn frames(name: &str, count: u64) -> Self {
        Self::new(
            name,
            (0..count).map(|id| Ok(test_frame(id))).collect(),
            CaptureError::Closed,
        )
    }

    fn endless(name: &str) -> Self {
        Self::frames(name, 10_000)
    }
}

#[async_trait]
impl CameraSource for ScriptedCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_resolution(&mut self, _width: u32, _height: u32) -> Result<(), CameraError> {
        Ok(())
    }

    async fn start(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    async fn capture(&mut self, _timeout: Duration) -> Result<FrameData, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(self.exhausted.clone()))
    }

    async fn close(&mut self) {}
}

/// Counts frames and remembers the last parameters it was given
#[derive(Clone, Default)]
struct CountingProcessor {
    processed: Arc<AtomicUsize>,
    configured: Arc<Mutex<Option<DetectionParams>>>,
    fail: bool,
}

impl FrameProcessor for CountingProcessor {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn configure(&mut self, params: &DetectionParams) {
        *self.configured.lock() = Some(*params);
    }

    fn process(&mut self, frame: FrameData) -> Result<ProcessedOutput, ProcessingError> {
        if self.fail {
            return Err(ProcessingError::UnsupportedFormat {
                processor: "counting",
                format: frame.format,
            });
        }
        self.processed.fetch_add(1, Ordering::SeqCst);
        let debug = frame.derive(vec![0u8; 16], FrameFormat::Gray8);
        Ok(ProcessedOutput::new(frame).with_debug("mask", debug))
    }
}

#[derive(Clone, Default)]
struct CountingStream {
    writes: Arc<AtomicUsize>,
}

#[async_trait]
impl VideoStream for CountingStream {
    async fn write_frame(&mut self, _frame: &FrameData, _quality: u8) -> Result<usize, StreamError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(100)
    }
}

struct FailingStream;

#[async_trait]
impl VideoStream for FailingStream {
    async fn write_frame(&mut self, _frame: &FrameData, _quality: u8) -> Result<usize, StreamError> {
        Err(StreamError::Write {
            details: "broken pipe".to_string(),
        })
    }
}

#[derive(Default)]
struct CountingShutdown {
    calls: AtomicUsize,
}

#[async_trait]
impl ShutdownAction for CountingShutdown {
    async fn execute(&self) -> Result<(), ShutdownError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingBackend {
    windows: Arc<Mutex<Vec<String>>>,
}

struct NullWindow;

impl DisplayWindow for NullWindow {
    fn show(&mut self, _frame: &FrameData) -> Result<(), DisplayError> {
        Ok(())
    }
}

impl DisplayBackend for RecordingBackend {
    fn create_window(&mut self, name: &str) -> Result<Box<dyn DisplayWindow>, DisplayError> {
        self.windows.lock().push(name.to_string());
        Ok(Box::new(NullWindow))
    }
}

struct Harness {
    store: Arc<MemoryParameterStore>,
    sink: Arc<OutputSink>,
    action: Arc<CountingShutdown>,
    shared: SharedOutputs,
}

impl Harness {
    fn new(stream: Box<dyn VideoStream>) -> Self {
        let store = Arc::new(MemoryParameterStore::new());
        let params: SharedParameterStore = store.clone();
        let sink = Arc::new(OutputSink::new(
            stream,
            None,
            75,
            Arc::new(StreamCounters::default()),
        ));
        let action = Arc::new(CountingShutdown::default());
        let shared = SharedOutputs {
            params,
            sink: Arc::clone(&sink),
            router: DebugChannelRouter::headless(),
            shutdown: Arc::new(ShutdownTrigger::new(action.clone())),
            states: LoopStates::new(),
        };
        Self {
            store,
            sink,
            action,
            shared,
        }
    }

    fn worker(
        &self,
        index: usize,
        camera: ScriptedCamera,
        processor: CountingProcessor,
        mode: ThresholdMode,
    ) -> CameraWorker {
        let settings = WorkerSettings {
            threshold_mode: mode,
            default_params: DetectionParams::default(),
            default_quality: 75,
            capture_timeout: Duration::from_millis(20),
        };
        CameraWorker::new(
            index,
            Box::new(camera),
            Box::new(processor),
            settings,
            self.shared.clone(),
        )
    }
}

#[tokio::test]
async fn test_shutdown_fires_once_after_false_polls() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    let mut worker = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        CountingProcessor::default(),
        ThresholdMode::Live,
    );

    harness.store.set_bool(SHUTDOWN_KEY, false);
    for _ in 0..100 {
        assert_eq!(worker.iterate().await, IterationOutcome::Delivered);
    }
    assert_eq!(harness.action.calls.load(Ordering::SeqCst), 0);

    harness.store.set_bool(SHUTDOWN_KEY, true);
    assert_eq!(worker.iterate().await, IterationOutcome::ShutdownRequested);
    assert_eq!(worker.state(), LoopState::Terminated);

    assert_eq!(worker.iterate().await, IterationOutcome::Terminated);
    assert_eq!(harness.action.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_guard_shared_across_loops() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    harness.store.set_bool(SHUTDOWN_KEY, true);

    let mut first = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        CountingProcessor::default(),
        ThresholdMode::Live,
    );
    let mut second = harness.worker(
        1,
        ScriptedCamera::endless("cam1"),
        CountingProcessor::default(),
        ThresholdMode::Live,
    );

    let (a, b) = tokio::join!(first.iterate(), second.iterate());

    assert_eq!(a, IterationOutcome::ShutdownRequested);
    assert_eq!(b, IterationOutcome::ShutdownRequested);
    assert_eq!(harness.action.calls.load(Ordering::SeqCst), 1);
    assert!(harness.shared.shutdown.has_fired());
}

#[tokio::test]
async fn test_send_failures_do_not_stop_the_loop() {
    const FAILURES: u64 = 7;

    let harness = Harness::new(Box::new(FailingStream));
    let processor = CountingProcessor::default();
    let camera = ScriptedCamera::frames("cam0", FAILURES + 1);
    let captures = Arc::clone(&camera.captures);
    let worker = harness.worker(0, camera, processor.clone(), ThresholdMode::Live);

    let exit = worker.run(CancellationToken::new()).await;

    assert_eq!(exit, WorkerExit::CameraClosed);
    assert_eq!(processor.processed.load(Ordering::SeqCst), (FAILURES + 1) as usize);
    assert_eq!(harness.sink.stats().send_failures, FAILURES + 1);
    // FAILURES + 1 frames, then the capture that reported the camera closed
    assert_eq!(captures.load(Ordering::SeqCst), (FAILURES + 2) as usize);
}

#[tokio::test]
async fn test_capture_timeout_produces_no_downstream_frames() {
    let stream = CountingStream::default();
    let writes = Arc::clone(&stream.writes);
    let harness = Harness::new(Box::new(stream));
    let processor = CountingProcessor::default();
    let camera = ScriptedCamera::new(
        "cam0",
        vec![
            Err(CaptureError::Timeout { timeout_ms: 20 }),
            Err(CaptureError::Timeout { timeout_ms: 20 }),
            Ok(test_frame(1)),
        ],
        CaptureError::Closed,
    );
    let mut worker = harness.worker(0, camera, processor.clone(), ThresholdMode::Live);

    assert_eq!(worker.iterate().await, IterationOutcome::Missed);
    assert_eq!(worker.state(), LoopState::DegradedCapture);
    assert_eq!(worker.iterate().await, IterationOutcome::Missed);

    assert_eq!(processor.processed.load(Ordering::SeqCst), 0);
    assert_eq!(writes.load(Ordering::SeqCst), 0);
    assert_eq!(harness.sink.stats().send_failures, 0);
    assert_eq!(worker.stats().capture_misses, 2);

    assert_eq!(worker.iterate().await, IterationOutcome::Delivered);
    assert_eq!(worker.state(), LoopState::Running);
    assert_eq!(
        harness.shared.states.get("cam0").await,
        Some(LoopState::Running)
    );
}

#[tokio::test]
async fn test_capture_stream_error_skips_iteration() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    let camera = ScriptedCamera::new(
        "cam0",
        vec![Err(CaptureError::Stream {
            details: "glitch".to_string(),
        })],
        CaptureError::Closed,
    );
    let mut worker = harness.worker(0, camera, CountingProcessor::default(), ThresholdMode::Live);

    assert_eq!(worker.iterate().await, IterationOutcome::Skipped);
    assert_eq!(worker.iterate().await, IterationOutcome::CameraClosed);
    assert_eq!(worker.state(), LoopState::Terminated);
}

#[tokio::test]
async fn test_processing_error_skips_iteration() {
    let stream = CountingStream::default();
    let writes = Arc::clone(&stream.writes);
    let harness = Harness::new(Box::new(stream));
    let processor = CountingProcessor {
        fail: true,
        ..CountingProcessor::default()
    };
    let mut worker = harness.worker(0, ScriptedCamera::endless("cam0"), processor, ThresholdMode::Live);

    assert_eq!(worker.iterate().await, IterationOutcome::Skipped);
    assert_eq!(worker.iterate().await, IterationOutcome::Skipped);
    assert_eq!(worker.stats().processing_errors, 2);
    assert_eq!(writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_only_active_camera_reaches_sink() {
    let stream = CountingStream::default();
    let writes = Arc::clone(&stream.writes);
    let harness = Harness::new(Box::new(stream));
    let first_processor = CountingProcessor::default();
    let second_processor = CountingProcessor::default();

    let mut first = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        first_processor.clone(),
        ThresholdMode::Live,
    );
    let mut second = harness.worker(
        1,
        ScriptedCamera::endless("cam1"),
        second_processor.clone(),
        ThresholdMode::Live,
    );

    assert_eq!(first.iterate().await, IterationOutcome::Delivered);
    assert_eq!(second.iterate().await, IterationOutcome::Discarded);
    assert_eq!(writes.load(Ordering::SeqCst), 1);

    harness.store.set_number(ACTIVE_CAMERA_KEY, 1.0);
    assert_eq!(first.iterate().await, IterationOutcome::Discarded);
    assert_eq!(second.iterate().await, IterationOutcome::Delivered);
    assert_eq!(writes.load(Ordering::SeqCst), 2);

    // Inactive loops still capture and process
    assert_eq!(first_processor.processed.load(Ordering::SeqCst), 2);
    assert_eq!(second_processor.processed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_quality_is_applied_each_iteration() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    let mut worker = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        CountingProcessor::default(),
        ThresholdMode::Live,
    );

    worker.iterate().await;
    assert_eq!(harness.sink.quality(), 75);

    harness.store.set_number(STREAM_QUALITY_KEY, 40.0);
    worker.iterate().await;
    assert_eq!(harness.sink.quality(), 40);

    harness.store.set_number(STREAM_QUALITY_KEY, 500.0);
    worker.iterate().await;
    assert_eq!(harness.sink.quality(), 100);
}

#[tokio::test]
async fn test_live_thresholds_are_reread_every_frame() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    let processor = CountingProcessor::default();
    let mut worker = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        processor.clone(),
        ThresholdMode::Live,
    );

    harness.store.set_number(H_MIN_KEY, 10.0);
    worker.iterate().await;
    assert_eq!(
        processor.configured.lock().as_ref().map(|p| p.hue),
        Some(ThresholdRange::new(10, 255))
    );

    harness.store.set_number(H_MIN_KEY, 99.0);
    worker.iterate().await;
    assert_eq!(
        processor.configured.lock().as_ref().map(|p| p.hue),
        Some(ThresholdRange::new(99, 255))
    );
}

#[tokio::test]
async fn test_fixed_thresholds_ignore_store() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    let processor = CountingProcessor::default();
    let mut worker = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        processor.clone(),
        ThresholdMode::Fixed,
    );

    harness.store.set_number(H_MIN_KEY, 10.0);
    worker.iterate().await;
    assert!(processor.configured.lock().is_none());
}

#[tokio::test]
async fn test_worker_stops_on_cancel() {
    let harness = Harness::new(Box::new(CountingStream::default()));
    let worker = harness.worker(
        0,
        ScriptedCamera::endless("cam0"),
        CountingProcessor::default(),
        ThresholdMode::Live,
    );
    let states = harness.shared.states.clone();

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(worker.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let exit = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exit, WorkerExit::Cancelled);
    assert_eq!(states.get("cam0").await, Some(LoopState::Terminated));
}

#[tokio::test]
async fn test_pipeline_only_shutdown_succeeds() {
    assert!(PipelineOnlyShutdown.execute().await.is_ok());
}

#[tokio::test]
async fn test_empty_shutdown_command_is_rejected() {
    let action = CommandShutdown::new(Vec::new());
    assert!(matches!(
        action.execute().await,
        Err(ShutdownError::EmptyCommand)
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_shutdown_command_exit_status() {
    assert!(CommandShutdown::new(vec!["true".to_string()])
        .execute()
        .await
        .is_ok());
    assert!(matches!(
        CommandShutdown::new(vec!["false".to_string()]).execute().await,
        Err(ShutdownError::Failed { .. })
    ));
}

fn pipeline_config() -> VisionConfig {
    let mut config = VisionConfig::default();
    config.cameras = vec![CameraConfig {
        name: "synthetic".to_string(),
        device: "0".to_string(),
        source: CameraSourceKind::Synthetic,
        resolution: (64, 48),
        fps: 30,
        capture_timeout_ms: 200,
    }];
    config.stream.ip = "127.0.0.1".to_string();
    config.stream.port = 0;
    config.display.mode = DisplayMode::Headless;
    config.shutdown.enabled = false;
    config
}

fn orchestrator_with_action(config: VisionConfig) -> (VisionOrchestrator, Arc<CountingShutdown>) {
    let action = Arc::new(CountingShutdown::default());
    let params: SharedParameterStore = Arc::new(MemoryParameterStore::new());
    let orchestrator = VisionOrchestrator::with_components(config, params, action.clone());
    (orchestrator, action)
}

#[tokio::test]
async fn test_required_display_when_headless_fails_startup() {
    let mut config = pipeline_config();
    config.display.require_display = true;
    let (mut orchestrator, _) = orchestrator_with_action(config);

    let err = orchestrator.start().await.unwrap_err();
    assert_eq!(err.exit_code(), exit_code::HEADLESS_ERROR);
}

#[tokio::test]
async fn test_camera_open_failure_exit_code() {
    let mut config = pipeline_config();
    config.cameras[0].device = "/nonexistent/camera".to_string();
    let (mut orchestrator, _) = orchestrator_with_action(config);

    let err = orchestrator.start().await.unwrap_err();
    assert_eq!(err.exit_code(), exit_code::CAMERA_OPEN_ERROR);
    assert_eq!(
        orchestrator.loop_state("synthetic").await,
        Some(LoopState::Terminated)
    );
}

#[tokio::test]
async fn test_video_server_bind_failure_exit_code() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = pipeline_config();
    config.stream.port = occupied.local_addr().unwrap().port();
    let (mut orchestrator, _) = orchestrator_with_action(config);

    let err = orchestrator.start().await.unwrap_err();
    assert_eq!(err.exit_code(), exit_code::VIDEO_SERVER_ERROR);
}

#[tokio::test]
async fn test_run_before_start_is_an_error() {
    let (mut orchestrator, _) = orchestrator_with_action(pipeline_config());
    assert!(orchestrator.run().await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remote_shutdown_stops_pipeline() {
    let (mut orchestrator, action) = orchestrator_with_action(pipeline_config());
    orchestrator.start().await.unwrap();
    assert!(orchestrator.is_headless());
    assert!(orchestrator.stream_address().is_some());

    let store = orchestrator.parameter_store();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.set_bool(SHUTDOWN_KEY, true);
    });

    let code = tokio::time::timeout(Duration::from_secs(10), orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(action.calls.load(Ordering::SeqCst), 1);
    assert!(orchestrator.shutdown_fired());
    assert!(orchestrator.stream_stats().frames_sent > 0);
    assert_eq!(
        orchestrator.loop_state("synthetic").await,
        Some(LoopState::Terminated)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_windowed_pipeline_opens_main_and_debug_windows() {
    let mut config = pipeline_config();
    config.display.mode = DisplayMode::Windowed;
    let backend = RecordingBackend::default();
    let windows = Arc::clone(&backend.windows);
    let (orchestrator, _) = orchestrator_with_action(config);
    let mut orchestrator = orchestrator.with_display_backend(Box::new(backend));

    orchestrator.start().await.unwrap();
    assert!(!orchestrator.is_headless());
    assert_eq!(windows.lock().as_slice(), &[MAIN_WINDOW.to_string()]);

    let store = orchestrator.parameter_store();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        store.set_bool(SHUTDOWN_KEY, true);
    });
    tokio::time::timeout(Duration::from_secs(10), orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    let windows = windows.lock().clone();
    assert_eq!(windows.len(), 2);
    assert!(windows.contains(&crate::processor::THRESHOLD_CHANNEL.to_string()));
}

#[test]
fn test_new_seeds_parameter_store() {
    let mut config = pipeline_config();
    config.parameters.initial = vec![crate::config::ParamSeed {
        key: ACTIVE_CAMERA_KEY.to_string(),
        value: crate::params::ParamValue::Number(1.0),
    }];

    let orchestrator = VisionOrchestrator::new(config);
    assert_eq!(
        orchestrator.parameter_store().get_number(ACTIVE_CAMERA_KEY, 0.0),
        1.0
    );
}

/// Takes a while to finish, counting starts and completions separately
#[derive(Default)]
struct SlowShutdown {
    started: AtomicUsize,
    completed: AtomicUsize,
}

#[async_trait]
impl ShutdownAction for SlowShutdown {
    async fn execute(&self) -> Result<(), ShutdownError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_shutdown_action_survives_abandoned_fire() {
    let action = Arc::new(SlowShutdown::default());
    let trigger = ShutdownTrigger::new(action.clone());

    // The caller gives up long before the action is done
    let abandoned = tokio::time::timeout(Duration::from_millis(50), trigger.fire()).await;
    assert!(abandoned.is_err());
    assert!(trigger.has_fired());
    assert!(!trigger.is_complete());

    trigger.wait().await;
    assert!(trigger.is_complete());
    assert_eq!(action.started.load(Ordering::SeqCst), 1);
    assert_eq!(action.completed.load(Ordering::SeqCst), 1);

    assert!(!trigger.fire().await);
    assert_eq!(action.started.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_caller_waits_for_running_action() {
    let action = Arc::new(SlowShutdown::default());
    let trigger = Arc::new(ShutdownTrigger::new(action.clone()));

    let first = tokio::spawn({
        let trigger = Arc::clone(&trigger);
        async move { trigger.fire().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!trigger.fire().await);
    assert_eq!(action.completed.load(Ordering::SeqCst), 1);
    assert!(first.await.unwrap());
}

#[tokio::test]
async fn test_wait_without_fire_returns_immediately() {
    let trigger = ShutdownTrigger::new(Arc::new(CountingShutdown::default()));
    tokio::time::timeout(Duration::from_millis(100), trigger.wait())
        .await
        .unwrap();
    assert!(!trigger.is_complete());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_shutdown_action_completes_with_two_cameras() {
    let mut config = pipeline_config();
    let mut second = config.cameras[0].clone();
    second.name = "synthetic-1".to_string();
    second.device = "1".to_string();
    config.cameras.push(second);

    let action = Arc::new(SlowShutdown::default());
    let params: SharedParameterStore = Arc::new(MemoryParameterStore::new());
    let mut orchestrator = VisionOrchestrator::with_components(config, params, action.clone());
    orchestrator.start().await.unwrap();

    let store = orchestrator.parameter_store();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.set_bool(SHUTDOWN_KEY, true);
    });

    let code = tokio::time::timeout(Duration::from_secs(10), orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(action.started.load(Ordering::SeqCst), 1);
    assert_eq!(action.completed.load(Ordering::SeqCst), 1);
}
