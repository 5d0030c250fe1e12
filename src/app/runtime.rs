use super::types::{ShutdownReason, WorkerExit};
use super::VisionOrchestrator;
use crate::error::{exit_code, Result, VisionError};
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{error, info, warn};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl VisionOrchestrator {
    /// Run every capture loop and the video server until shutdown, returning
    /// the process exit code
    pub async fn run(&mut self) -> Result<i32> {
        let server = self
            .server
            .take()
            .ok_or_else(|| VisionError::system("Pipeline has not been started"))?;

        info!("Vision pipeline is running");

        let (reason_sender, mut reason_receiver) = mpsc::channel(4);
        self.setup_signal_handlers(reason_sender.clone());

        let server_cancel = self.cancellation_token.clone();
        let server_reasons = reason_sender.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = server.serve(server_cancel).await {
                error!("Video server error: {}", e);
                let _ = server_reasons
                    .send(ShutdownReason::Error(e.to_string()))
                    .await;
            }
        });

        let mut workers = JoinSet::new();
        for worker in self.workers.drain(..) {
            workers.spawn(worker.run(self.cancellation_token.clone()));
        }

        let reason = loop {
            tokio::select! {
                Some(reason) = reason_receiver.recv() => break reason,
                joined = workers.join_next() => match joined {
                    Some(Ok(WorkerExit::ShutdownRequested)) => break ShutdownReason::RemoteRequest,
                    Some(Ok(exit)) => warn!("Capture loop ended: {:?}", exit),
                    Some(Err(e)) => error!("Capture loop task failed: {}", e),
                    None => break ShutdownReason::Error("all capture loops have stopped".to_string()),
                },
            }
        };

        info!("Shutdown initiated: {:?}", reason);
        self.shutdown(workers, server_task).await;

        let code = match reason {
            ShutdownReason::Error(_) => exit_code::UNKNOWN_ERROR,
            ShutdownReason::Signal(_) | ShutdownReason::RemoteRequest => 0,
        };

        info!("Vision pipeline shutdown complete");
        Ok(code)
    }

    async fn shutdown(&mut self, mut workers: JoinSet<WorkerExit>, server_task: JoinHandle<()>) {
        info!("Beginning graceful shutdown");
        self.cancellation_token.cancel();

        let drained = timeout(STOP_TIMEOUT, async {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    error!("Capture loop task failed during shutdown: {}", e);
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!("Capture loops did not stop within {:?}; aborting", STOP_TIMEOUT);
            workers.abort_all();
        }

        match timeout(STOP_TIMEOUT, server_task).await {
            Ok(Ok(())) => info!("Video server stopped"),
            Ok(Err(e)) => error!("Video server task failed: {}", e),
            Err(_) => warn!("Video server did not stop within {:?}", STOP_TIMEOUT),
        }

        if self.shutdown.has_fired() && !self.shutdown.is_complete() {
            info!("Waiting for the shutdown action to finish");
            self.shutdown.wait().await;
        }

        if let Some(display) = self.display.take() {
            display.stop();
        }
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self, reasons: mpsc::Sender<ShutdownReason>) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let reasons = reasons.clone();
            tokio::spawn(async move {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            let _ = reasons
                                .send(ShutdownReason::Signal("SIGTERM".to_string()))
                                .await;
                        }
                    }
                    Err(e) => error!("Failed to register SIGTERM handler: {}", e),
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                let _ = reasons
                    .send(ShutdownReason::Signal("SIGINT".to_string()))
                    .await;
            }
        });
    }
}
