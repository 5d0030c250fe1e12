mod backend;
mod context;
#[cfg(all(feature = "display", target_os = "linux"))]
mod gst;
mod router;
mod stats;

pub use backend::{default_backend, display_available, DisplayBackend, DisplayWindow, MAIN_WINDOW};
pub use context::{DisplayContext, WindowUpdate};
#[cfg(all(feature = "display", target_os = "linux"))]
pub use gst::GstWindowBackend;
pub use router::DebugChannelRouter;
pub use stats::DisplayStats;
