use crate::config::ProcessorConfig;
use crate::frame::FrameData;
use std::collections::BTreeMap;

/// Smallest value an 8-bit channel can take
pub const CHANNEL_MIN: i64 = 0;
/// Largest value an 8-bit channel can take
pub const CHANNEL_MAX: i64 = 255;

/// Inclusive per-channel bound used to classify pixels.
///
/// Construction clamps both ends into `[CHANNEL_MIN, CHANNEL_MAX]` and swaps
/// them when they arrive inverted, so `low() <= high()` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdRange {
    low: u8,
    high: u8,
}

impl ThresholdRange {
    /// The whole channel
    pub const FULL: ThresholdRange = ThresholdRange { low: 0, high: 255 };

    pub fn new(low: i64, high: i64) -> Self {
        let low = low.clamp(CHANNEL_MIN, CHANNEL_MAX) as u8;
        let high = high.clamp(CHANNEL_MIN, CHANNEL_MAX) as u8;

        if low <= high {
            Self { low, high }
        } else {
            Self { low: high, high: low }
        }
    }

    /// Build from raw parameter-store numbers (fractions are truncated)
    pub fn from_raw(low: f64, high: f64) -> Self {
        Self::new(low as i64, high as i64)
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn contains(&self, value: u8) -> bool {
        value >= self.low && value <= self.high
    }
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Tuning injected into a processor before each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub hue: ThresholdRange,
    pub saturation: ThresholdRange,
    pub value: ThresholdRange,
    /// Minimum blob area in pixels
    pub min_size: f64,
}

impl DetectionParams {
    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self {
            hue: ThresholdRange::new(config.hue.0, config.hue.1),
            saturation: ThresholdRange::new(config.saturation.0, config.saturation.1),
            value: ThresholdRange::new(config.value.0, config.value.1),
            min_size: config.min_size.max(0.0),
        }
    }
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            hue: ThresholdRange::FULL,
            saturation: ThresholdRange::FULL,
            value: ThresholdRange::FULL,
            min_size: 0.0,
        }
    }
}

/// Result of processing one frame
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    /// Frame published to the display and the network stream
    pub main: FrameData,
    /// Auxiliary frames keyed by debug channel name
    pub debug: BTreeMap<String, FrameData>,
}

impl ProcessedOutput {
    pub fn new(main: FrameData) -> Self {
        Self {
            main,
            debug: BTreeMap::new(),
        }
    }

    pub fn with_debug<S: Into<String>>(mut self, name: S, frame: FrameData) -> Self {
        self.debug.insert(name.into(), frame);
        self
    }
}
