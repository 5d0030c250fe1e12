use crate::config::DisplayMode;
use crate::error::DisplayError;
use crate::frame::FrameData;
use tracing::debug;

/// Name of the window showing each loop's main output
pub const MAIN_WINDOW: &str = "Processed Image";

/// An on-screen window. Created, updated and dropped on the display thread only.
pub trait DisplayWindow {
    /// Replace the window contents with a copy of `frame`
    fn show(&mut self, frame: &FrameData) -> Result<(), DisplayError>;
}

/// Window factory moved onto the display thread at startup
pub trait DisplayBackend: Send + 'static {
    fn create_window(&mut self, name: &str) -> Result<Box<dyn DisplayWindow>, DisplayError>;
}

/// Whether windows can be shown in this environment
pub fn display_available(mode: DisplayMode) -> bool {
    match mode {
        DisplayMode::Headless => false,
        DisplayMode::Windowed => true,
        DisplayMode::Auto => {
            let found = ["DISPLAY", "WAYLAND_DISPLAY"]
                .iter()
                .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()));
            debug!("Display auto-detection: {}", if found { "found" } else { "none" });
            found
        }
    }
}

/// The window backend compiled into this build, if any
pub fn default_backend() -> Result<Box<dyn DisplayBackend>, DisplayError> {
    #[cfg(all(feature = "display", target_os = "linux"))]
    {
        Ok(Box::new(super::gst::GstWindowBackend::new()?))
    }

    #[cfg(not(all(feature = "display", target_os = "linux")))]
    {
        tracing::warn!("Window support is not compiled in; running headless");
        Err(DisplayError::Headless)
    }
}
