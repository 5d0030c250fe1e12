use super::store::ParameterStore;
use crate::processor::{DetectionParams, ThresholdRange};

pub const H_MIN_KEY: &str = "hMin";
pub const H_MAX_KEY: &str = "hMax";
pub const S_MIN_KEY: &str = "sMin";
pub const S_MAX_KEY: &str = "sMax";
pub const V_MIN_KEY: &str = "vMin";
pub const V_MAX_KEY: &str = "vMax";
pub const MIN_SIZE_KEY: &str = "minSize";
pub const ACTIVE_CAMERA_KEY: &str = "activeCamera";
pub const STREAM_QUALITY_KEY: &str = "streamQuality";
pub const SHUTDOWN_KEY: &str = "shutdown";

/// Read the detection thresholds, falling back to `defaults` per key
pub fn read_detection_params(
    store: &dyn ParameterStore,
    defaults: &DetectionParams,
) -> DetectionParams {
    let range = |low_key: &str, high_key: &str, fallback: ThresholdRange| {
        ThresholdRange::from_raw(
            store.get_number(low_key, fallback.low() as f64),
            store.get_number(high_key, fallback.high() as f64),
        )
    };

    DetectionParams {
        hue: range(H_MIN_KEY, H_MAX_KEY, defaults.hue),
        saturation: range(S_MIN_KEY, S_MAX_KEY, defaults.saturation),
        value: range(V_MIN_KEY, V_MAX_KEY, defaults.value),
        min_size: store.get_number(MIN_SIZE_KEY, defaults.min_size).max(0.0),
    }
}

/// JPEG quality clamped to 1..=100
pub fn read_stream_quality(store: &dyn ParameterStore, default: u8) -> u8 {
    store
        .get_number(STREAM_QUALITY_KEY, default as f64)
        .clamp(1.0, 100.0) as u8
}

/// Index of the camera whose output reaches the sink; negative values select 0
pub fn read_active_camera(store: &dyn ParameterStore, default: usize) -> usize {
    let value = store.get_number(ACTIVE_CAMERA_KEY, default as f64);
    if value <= 0.0 {
        0
    } else {
        value as usize
    }
}

pub fn read_shutdown_requested(store: &dyn ParameterStore) -> bool {
    store.get_bool(SHUTDOWN_KEY, false)
}
