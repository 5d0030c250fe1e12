/// Lifecycle of one camera's capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    /// The last capture timed out; the next iteration tries again
    DegradedCapture,
    ShuttingDown,
    Terminated,
}

/// Why the pipeline is stopping
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    RemoteRequest,
    Error(String),
}

/// How a capture loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Cancelled,
    ShutdownRequested,
    CameraClosed,
}

/// Result of one capture loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Main output reached the sink and the stream accepted it
    Delivered,
    /// Main output reached the sink but the stream write failed
    SendFailed,
    /// Frame processed but another camera is active
    Discarded,
    /// No frame within the capture timeout
    Missed,
    /// Capture or processing failed for this frame
    Skipped,
    ShutdownRequested,
    CameraClosed,
    /// The loop already stopped; nothing was polled
    Terminated,
}
