mod keys;
mod routes;
mod store;

pub use keys::{
    read_active_camera, read_detection_params, read_shutdown_requested, read_stream_quality,
    ACTIVE_CAMERA_KEY, H_MAX_KEY, H_MIN_KEY, MIN_SIZE_KEY, SHUTDOWN_KEY, STREAM_QUALITY_KEY,
    S_MAX_KEY, S_MIN_KEY, V_MAX_KEY, V_MIN_KEY,
};
pub use routes::param_routes;
pub use store::{MemoryParameterStore, ParamValue, ParameterStore, SharedParameterStore};
