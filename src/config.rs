use crate::params::ParamValue;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VisionConfig {
    #[serde(default = "default_cameras")]
    pub cameras: Vec<CameraConfig>,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub parameters: ParameterConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Name used in logs and loop state tracking
    #[serde(default = "default_camera_name")]
    pub name: String,

    /// Device index ("0") or device path whose trailing digits give the index
    #[serde(default = "default_camera_device")]
    pub device: String,

    /// Which capture backend to use
    #[serde(default)]
    pub source: CameraSourceKind,

    /// Camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Upper bound for a single capture
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraSourceKind {
    #[default]
    V4l2,
    Synthetic,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub kind: ProcessorKind,

    /// Live thresholds are re-read from the parameter store every frame
    #[serde(default)]
    pub threshold_mode: ThresholdMode,

    #[serde(default = "default_channel_range")]
    pub hue: (i64, i64),

    #[serde(default = "default_channel_range")]
    pub saturation: (i64, i64),

    #[serde(default = "default_channel_range")]
    pub value: (i64, i64),

    /// Minimum blob area in pixels
    #[serde(default = "default_min_size")]
    pub min_size: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    #[default]
    ColorThreshold,
    Passthrough,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    #[default]
    Live,
    Fixed,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamConfig {
    /// IP address to bind to
    #[serde(default = "default_stream_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_stream_port")]
    pub port: u16,

    /// JPEG quality used until the parameter store says otherwise
    #[serde(default = "default_stream_quality")]
    pub quality: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mode: DisplayMode,

    /// Exit with the headless error code when no display is available
    #[serde(default)]
    pub require_display: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Auto,
    Headless,
    Windowed,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ParameterConfig {
    /// Expose GET/PUT /params on the video server
    #[serde(default = "default_remote_api")]
    pub remote_api: bool,

    /// Values seeded into the store at startup
    #[serde(default)]
    pub initial: Vec<ParamSeed>,
}

/// One `[[parameters.initial]]` entry
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ParamSeed {
    pub key: String,
    pub value: ParamValue,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShutdownConfig {
    /// When false the remote shutdown flag only stops the pipeline
    #[serde(default = "default_shutdown_enabled")]
    pub enabled: bool,

    #[serde(default = "default_shutdown_command")]
    pub command: Vec<String>,
}

impl VisionConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("visionpipe.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("stream.ip", default_stream_ip())?
            .set_default("stream.port", default_stream_port())?
            .set_default("stream.quality", i64::from(default_stream_quality()))?
            .set_default("processor.min_size", default_min_size())?
            .set_default("parameters.remote_api", default_remote_api())?
            .set_default("shutdown.enabled", default_shutdown_enabled())?
            .add_source(File::with_name(&path_str).required(false))
            // VISIONPIPE__STREAM__PORT=8080 style overrides
            .add_source(Environment::with_prefix("VISIONPIPE").separator("__"))
            .build()?;

        let config: VisionConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cameras.is_empty() {
            return Err(ConfigError::Message(
                "At least one camera must be configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for camera in &self.cameras {
            if !names.insert(camera.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Camera name '{}' is used more than once",
                    camera.name
                )));
            }

            if camera.resolution.0 == 0 || camera.resolution.1 == 0 {
                return Err(ConfigError::Message(format!(
                    "Camera '{}' resolution must be greater than 0",
                    camera.name
                )));
            }

            if camera.fps == 0 {
                return Err(ConfigError::Message(format!(
                    "Camera '{}' fps must be greater than 0",
                    camera.name
                )));
            }

            if camera.capture_timeout_ms == 0 {
                return Err(ConfigError::Message(format!(
                    "Camera '{}' capture_timeout_ms must be greater than 0",
                    camera.name
                )));
            }
        }

        if !(1..=100).contains(&self.stream.quality) {
            return Err(ConfigError::Message(
                "Stream quality must be between 1 and 100".to_string(),
            ));
        }

        if self.processor.min_size < 0.0 {
            return Err(ConfigError::Message(
                "Processor min_size must not be negative".to_string(),
            ));
        }

        if self.shutdown.enabled && self.shutdown.command.is_empty() {
            return Err(ConfigError::Message(
                "Shutdown command must not be empty when shutdown is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            cameras: default_cameras(),
            processor: ProcessorConfig::default(),
            stream: StreamConfig::default(),
            display: DisplayConfig::default(),
            parameters: ParameterConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: default_camera_name(),
            device: default_camera_device(),
            source: CameraSourceKind::default(),
            resolution: default_camera_resolution(),
            fps: default_camera_fps(),
            capture_timeout_ms: default_capture_timeout_ms(),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            kind: ProcessorKind::default(),
            threshold_mode: ThresholdMode::default(),
            hue: default_channel_range(),
            saturation: default_channel_range(),
            value: default_channel_range(),
            min_size: default_min_size(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ip: default_stream_ip(),
            port: default_stream_port(),
            quality: default_stream_quality(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            require_display: false,
        }
    }
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            remote_api: default_remote_api(),
            initial: Vec::new(),
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            enabled: default_shutdown_enabled(),
            command: default_shutdown_command(),
        }
    }
}

// Default value functions
fn default_cameras() -> Vec<CameraConfig> {
    vec![CameraConfig::default()]
}
fn default_camera_name() -> String {
    "camera0".to_string()
}
fn default_camera_device() -> String {
    "0".to_string()
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_capture_timeout_ms() -> u64 {
    1000
}

fn default_channel_range() -> (i64, i64) {
    (0, 255)
}
fn default_min_size() -> f64 {
    0.0
}

fn default_stream_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_stream_port() -> u16 {
    1180
}
fn default_stream_quality() -> u8 {
    75
}

fn default_remote_api() -> bool {
    true
}

fn default_shutdown_enabled() -> bool {
    true
}
fn default_shutdown_command() -> Vec<String> {
    vec!["shutdown".to_string(), "-h".to_string(), "now".to_string()]
}
