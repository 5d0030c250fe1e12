use super::handle::CameraHandle;
use super::synthetic::SyntheticCamera;
use crate::config::{CameraConfig, CameraSourceKind};
use crate::error::{CameraError, CaptureError};
use crate::frame::FrameData;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// One capture device.
///
/// `capture` is the only call that waits on the device and never waits longer
/// than the timeout it is given. A timeout is an ordinary miss; `Closed` means
/// no further frames will ever arrive.
#[async_trait]
pub trait CameraSource: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Change the capture resolution
    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError>;

    /// Begin streaming from the device
    async fn start(&mut self) -> Result<(), CameraError>;

    /// Wait up to `timeout` for the newest frame
    async fn capture(&mut self, timeout: Duration) -> Result<FrameData, CaptureError>;

    /// Release the device; later captures return [`CaptureError::Closed`]
    async fn close(&mut self);
}

/// Open the source described by `config`, apply its resolution and start it
pub async fn open_camera(config: &CameraConfig) -> Result<Box<dyn CameraSource>, CameraError> {
    let handle = CameraHandle::parse(&config.device)?;
    let index = handle.resolve_index()?;

    info!(
        "Opening camera {} ({} -> index {}, {}x{} @ {}fps, {:?})",
        config.name,
        handle,
        index,
        config.resolution.0,
        config.resolution.1,
        config.fps,
        config.source
    );

    let mut source: Box<dyn CameraSource> = match config.source {
        CameraSourceKind::Synthetic => Box::new(SyntheticCamera::new(&config.name, config.fps)),
        CameraSourceKind::V4l2 => open_v4l2(config, index)?,
    };

    source.set_resolution(config.resolution.0, config.resolution.1)?;
    source.start().await?;

    Ok(source)
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn open_v4l2(config: &CameraConfig, index: u32) -> Result<Box<dyn CameraSource>, CameraError> {
    Ok(Box::new(super::gst::GstCamera::new(
        &config.name,
        index,
        config.fps,
    )?))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn open_v4l2(config: &CameraConfig, _index: u32) -> Result<Box<dyn CameraSource>, CameraError> {
    tracing::error!(
        "Camera {} requests a V4L2 source but camera support is not compiled in",
        config.name
    );
    Err(CameraError::NotAvailable("v4l2".to_string()))
}
