mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;
mod worker;

#[cfg(test)]
mod tests;

pub use orchestrator::VisionOrchestrator;
pub use shutdown::{
    shutdown_action_from_config, CommandShutdown, PipelineOnlyShutdown, ShutdownAction,
    ShutdownTrigger,
};
pub use state::LoopStates;
pub use types::{IterationOutcome, LoopState, ShutdownReason, WorkerExit};
pub use worker::{CameraWorker, SharedOutputs, WorkerSettings, WorkerStats};
