use super::shutdown::{shutdown_action_from_config, ShutdownAction, ShutdownTrigger};
use super::state::LoopStates;
use super::types::LoopState;
use super::worker::CameraWorker;
use crate::config::VisionConfig;
use crate::display::{DisplayBackend, DisplayContext};
use crate::params::{MemoryParameterStore, SharedParameterStore};
use crate::streaming::{StreamCounters, StreamStats, VideoServer};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the shared pipeline pieces and one capture loop per camera
pub struct VisionOrchestrator {
    pub(super) config: VisionConfig,
    pub(super) params: SharedParameterStore,
    pub(super) shutdown: Arc<ShutdownTrigger>,
    pub(super) states: LoopStates,
    pub(super) counters: Arc<StreamCounters>,

    // Filled in by start()
    pub(super) display: Option<DisplayContext>,
    pub(super) display_backend: Option<Box<dyn DisplayBackend>>,
    pub(super) server: Option<VideoServer>,
    pub(super) stream_address: Option<SocketAddr>,
    pub(super) workers: Vec<CameraWorker>,

    pub(super) cancellation_token: CancellationToken,
}

impl VisionOrchestrator {
    /// Create an orchestrator with an in-memory parameter store seeded from
    /// the configuration and the configured shutdown action
    pub fn new(config: VisionConfig) -> Self {
        let params: SharedParameterStore = Arc::new(MemoryParameterStore::with_values(
            config
                .parameters
                .initial
                .iter()
                .map(|seed| (seed.key.clone(), seed.value)),
        ));
        let action = shutdown_action_from_config(&config.shutdown);

        Self::with_components(config, params, action)
    }

    /// Create an orchestrator around an existing parameter store and
    /// shutdown action
    pub fn with_components(
        config: VisionConfig,
        params: SharedParameterStore,
        action: Arc<dyn ShutdownAction>,
    ) -> Self {
        Self {
            config,
            params,
            shutdown: Arc::new(ShutdownTrigger::new(action)),
            states: LoopStates::new(),
            counters: Arc::new(StreamCounters::default()),
            display: None,
            display_backend: None,
            server: None,
            stream_address: None,
            workers: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Use `backend` for windows instead of the compiled-in one
    pub fn with_display_backend(mut self, backend: Box<dyn DisplayBackend>) -> Self {
        self.display_backend = Some(backend);
        self
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    pub fn parameter_store(&self) -> SharedParameterStore {
        Arc::clone(&self.params)
    }

    /// Address the video server is bound to, once started
    pub fn stream_address(&self) -> Option<SocketAddr> {
        self.stream_address
    }

    pub fn stream_stats(&self) -> StreamStats {
        self.counters.snapshot()
    }

    pub fn is_headless(&self) -> bool {
        self.display.is_none()
    }

    pub fn shutdown_fired(&self) -> bool {
        self.shutdown.has_fired()
    }

    /// Token that stops every loop and the video server when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub async fn loop_state(&self, camera: &str) -> Option<LoopState> {
        self.states.get(camera).await
    }

    pub async fn loop_states(&self) -> HashMap<String, LoopState> {
        self.states.all().await
    }
}
