use crate::config::ShutdownConfig;
use crate::error::ShutdownError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What happens when the remote shutdown flag is raised
#[async_trait]
pub trait ShutdownAction: Send + Sync {
    async fn execute(&self) -> Result<(), ShutdownError>;
}

/// Runs an external command, typically powering the host off
pub struct CommandShutdown {
    command: Vec<String>,
}

impl CommandShutdown {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl ShutdownAction for CommandShutdown {
    async fn execute(&self) -> Result<(), ShutdownError> {
        let (program, args) = self.command.split_first().ok_or(ShutdownError::EmptyCommand)?;
        let rendered = self.command.join(" ");

        info!("Running shutdown command: {}", rendered);
        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|e| ShutdownError::Spawn {
                command: rendered.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(ShutdownError::Failed {
                command: rendered,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Stops the pipeline without touching the host
pub struct PipelineOnlyShutdown;

#[async_trait]
impl ShutdownAction for PipelineOnlyShutdown {
    async fn execute(&self) -> Result<(), ShutdownError> {
        info!("Shutdown requested; host shutdown is disabled, stopping pipeline only");
        Ok(())
    }
}

pub fn shutdown_action_from_config(config: &ShutdownConfig) -> Arc<dyn ShutdownAction> {
    if config.enabled {
        Arc::new(CommandShutdown::new(config.command.clone()))
    } else {
        Arc::new(PipelineOnlyShutdown)
    }
}

/// Marks the action complete even if its task panics or is aborted
struct CompleteOnDrop(Arc<watch::Sender<bool>>);

impl Drop for CompleteOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

/// One-shot wrapper shared by every capture loop.
///
/// The action runs on its own task, so a capture loop being cancelled while
/// it waits does not cut the action short.
pub struct ShutdownTrigger {
    fired: AtomicBool,
    action: Arc<dyn ShutdownAction>,
    completed: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn new(action: Arc<dyn ShutdownAction>) -> Self {
        let (completed, _) = watch::channel(false);
        Self {
            fired: AtomicBool::new(false),
            action,
            completed: Arc::new(completed),
        }
    }

    /// Run the action unless it already ran, then wait for it to finish.
    /// Returns whether this call started it.
    ///
    /// A failing action is logged; the caller proceeds to exit either way.
    pub async fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!("Shutdown already triggered; waiting for the action to finish");
            self.wait().await;
            return false;
        }

        let action = Arc::clone(&self.action);
        let guard = CompleteOnDrop(Arc::clone(&self.completed));
        let task = tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = action.execute().await {
                error!("Shutdown action failed: {}", e);
            }
        });

        if let Err(e) = task.await {
            error!("Shutdown action task failed: {}", e);
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Whether a fired action has run to completion
    pub fn is_complete(&self) -> bool {
        *self.completed.borrow()
    }

    /// Wait until a fired action has finished. Returns at once if the
    /// trigger never fired.
    pub async fn wait(&self) {
        if !self.has_fired() {
            return;
        }
        let mut completed = self.completed.subscribe();
        if completed.wait_for(|done| *done).await.is_err() {
            warn!("Shutdown completion channel closed");
        }
    }
}
