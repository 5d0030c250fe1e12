use thiserror::Error;

/// Process exit codes reported for fatal startup failures
pub mod exit_code {
    pub const CAMERA_OPEN_ERROR: i32 = 1;
    pub const VIDEO_SERVER_ERROR: i32 = 2;
    pub const HEADLESS_ERROR: i32 = 3;
    pub const UNKNOWN_ERROR: i32 = 4;
}

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Shutdown error: {0}")]
    Shutdown(#[from] ShutdownError),

    #[error("System error: {message}")]
    System { message: String },
}

impl VisionError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// Exit code used when this error aborts startup
    pub fn exit_code(&self) -> i32 {
        match self {
            VisionError::Camera(_) => exit_code::CAMERA_OPEN_ERROR,
            VisionError::Stream(StreamError::BindFailed { .. }) => exit_code::VIDEO_SERVER_ERROR,
            VisionError::Display(DisplayError::Headless) => exit_code::HEADLESS_ERROR,
            _ => exit_code::UNKNOWN_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Invalid camera handle '{handle}': {reason}")]
    InvalidHandle { handle: String, reason: String },

    #[error("Failed to open camera {device}: {details}")]
    DeviceOpen { device: String, details: String },

    #[error("Camera configuration failed: {details}")]
    Configuration { details: String },

    #[error("Camera source '{0}' is not available in this build")]
    NotAvailable(String),
}

/// Outcome of a failed capture attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("No frame within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Camera is closed")]
    Closed,

    #[error("Capture stream error: {details}")]
    Stream { details: String },
}

impl CaptureError {
    /// Whether the owning loop should skip the iteration and keep going
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CaptureError::Closed)
    }
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Unsupported frame format {format:?} for {processor}")]
    UnsupportedFormat {
        processor: &'static str,
        format: crate::frame::FrameFormat,
    },

    #[error("Frame {frame_id} has {actual} bytes, expected {expected}")]
    BadFrameSize {
        frame_id: u64,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("No display available (headless environment)")]
    Headless,

    #[error("Display context has stopped")]
    ContextClosed,

    #[error("Failed to start display thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("Debug channel name '{0}' is reserved for the main window")]
    ReservedChannel(String),

    #[error("Failed to create window '{name}': {details}")]
    WindowCreate { name: String, details: String },

    #[error("Failed to render to window '{name}': {details}")]
    Render { name: String, details: String },
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to bind video server to {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Video server failed: {details}")]
    Server { details: String },

    #[error("JPEG encoding failed for frame {frame_id}: {details}")]
    Encode { frame_id: u64, details: String },

    #[error("Stream write failed: {details}")]
    Write { details: String },
}

#[derive(Error, Debug)]
pub enum ShutdownError {
    #[error("Shutdown command is empty")]
    EmptyCommand,

    #[error("Failed to run shutdown command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Shutdown command '{command}' exited with {status}")]
    Failed { command: String, status: String },
}

pub type Result<T> = std::result::Result<T, VisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_exit_codes_are_distinct() {
        let camera = VisionError::from(CameraError::DeviceOpen {
            device: "0".to_string(),
            details: "busy".to_string(),
        });
        let server = VisionError::from(StreamError::BindFailed {
            address: "0.0.0.0:1180".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        });
        let headless = VisionError::from(DisplayError::Headless);
        let other = VisionError::system("boom");

        assert_eq!(camera.exit_code(), exit_code::CAMERA_OPEN_ERROR);
        assert_eq!(server.exit_code(), exit_code::VIDEO_SERVER_ERROR);
        assert_eq!(headless.exit_code(), exit_code::HEADLESS_ERROR);
        assert_eq!(other.exit_code(), exit_code::UNKNOWN_ERROR);
    }

    #[test]
    fn test_capture_error_recoverability() {
        assert!(CaptureError::Timeout { timeout_ms: 10 }.is_recoverable());
        assert!(CaptureError::Stream {
            details: "glitch".to_string()
        }
        .is_recoverable());
        assert!(!CaptureError::Closed.is_recoverable());
    }
}
