use super::backend::MAIN_WINDOW;
use super::context::{DisplayContext, WindowUpdate};
use crate::error::DisplayError;
use crate::frame::FrameData;
use tracing::debug;

/// Sends named debug frames to their own persistent windows.
///
/// Each distinct name gets one window for the life of the process. Without a
/// display context every call is a no-op. The main window's name is not
/// available as a channel name.
#[derive(Clone)]
pub struct DebugChannelRouter {
    context: Option<DisplayContext>,
}

impl DebugChannelRouter {
    pub fn new(context: Option<DisplayContext>) -> Self {
        Self { context }
    }

    pub fn headless() -> Self {
        Self { context: None }
    }

    pub fn is_headless(&self) -> bool {
        self.context.is_none()
    }

    /// Show `frame` in the window for channel `name`
    pub async fn route(&self, name: &str, frame: FrameData) -> Result<(), DisplayError> {
        if name == MAIN_WINDOW {
            return Err(DisplayError::ReservedChannel(name.to_string()));
        }

        let Some(context) = &self.context else {
            return Ok(());
        };

        if context.show(name, frame).await? == WindowUpdate::Created {
            debug!("Debug channel '{}' opened", name);
        }
        Ok(())
    }
}
