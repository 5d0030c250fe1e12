use super::types::LoopState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Current state of every capture loop, keyed by camera name
#[derive(Clone, Default)]
pub struct LoopStates {
    states: Arc<Mutex<HashMap<String, LoopState>>>,
}

impl LoopStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update a loop's state
    pub async fn set(&self, camera: &str, state: LoopState) {
        let mut states = self.states.lock().await;
        if states.insert(camera.to_string(), state) != Some(state) {
            debug!("Capture loop '{}' state changed to: {:?}", camera, state);
        }
    }

    /// Get a loop's state
    pub async fn get(&self, camera: &str) -> Option<LoopState> {
        let states = self.states.lock().await;
        states.get(camera).copied()
    }

    /// Get all loop states
    pub async fn all(&self) -> HashMap<String, LoopState> {
        let states = self.states.lock().await;
        states.clone()
    }
}
