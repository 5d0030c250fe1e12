#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst;
mod handle;
mod source;
mod synthetic;

#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst::GstCamera;
pub use handle::{parse_trailing_index, CameraHandle};
pub use source::{open_camera, CameraSource};
pub use synthetic::SyntheticCamera;
