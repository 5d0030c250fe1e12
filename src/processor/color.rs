use super::interface::FrameProcessor;
use super::types::{DetectionParams, ProcessedOutput};
use crate::error::ProcessingError;
use crate::frame::{FrameData, FrameFormat};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;
use tracing::trace;

/// Debug channel carrying the binary threshold mask
pub const THRESHOLD_CHANNEL: &str = "threshold";

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Axis-aligned bounding box of a connected region of the mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of mask pixels in the region
    pub area: u32,
}

/// HSV color threshold followed by a connected-region size filter.
///
/// Hue is scaled onto the same 0..=255 range as saturation and value so all
/// three channels share one [`ThresholdRange`](super::ThresholdRange)
/// convention. The main output is the input with every surviving blob
/// outlined; the mask goes to the [`THRESHOLD_CHANNEL`] debug channel.
pub struct ColorThresholdProcessor {
    params: DetectionParams,
    last_blobs: Vec<Blob>,
}

impl ColorThresholdProcessor {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            params,
            last_blobs: Vec::new(),
        }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Blobs found in the most recent frame
    pub fn blobs(&self) -> &[Blob] {
        &self.last_blobs
    }

    fn threshold(&self, rgb: &RgbImage) -> GrayImage {
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
            let (h, s, v) = rgb_to_hsv(r, g, b);
            if self.params.hue.contains(h)
                && self.params.saturation.contains(s)
                && self.params.value.contains(v)
            {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

impl FrameProcessor for ColorThresholdProcessor {
    fn name(&self) -> &'static str {
        "color_threshold"
    }

    fn configure(&mut self, params: &DetectionParams) {
        self.params = *params;
    }

    fn process(&mut self, frame: FrameData) -> Result<ProcessedOutput, ProcessingError> {
        if frame.format != FrameFormat::Rgb24 {
            return Err(ProcessingError::UnsupportedFormat {
                processor: "color_threshold",
                format: frame.format,
            });
        }

        if let Some(expected) = frame.expected_size() {
            if frame.data.len() != expected {
                return Err(ProcessingError::BadFrameSize {
                    frame_id: frame.id,
                    expected,
                    actual: frame.data.len(),
                });
            }
        }

        let rgb = RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec()).ok_or(
            ProcessingError::BadFrameSize {
                frame_id: frame.id,
                expected: frame.expected_size().unwrap_or_default(),
                actual: frame.data.len(),
            },
        )?;

        let mask = self.threshold(&rgb);
        let blobs: Vec<Blob> = find_blobs(&mask)
            .into_iter()
            .filter(|blob| blob.area as f64 >= self.params.min_size)
            .collect();

        trace!("Frame {}: {} blobs above min size", frame.id, blobs.len());

        let mut annotated = rgb;
        for blob in &blobs {
            let rect = Rect::at(blob.x as i32, blob.y as i32).of_size(blob.width, blob.height);
            draw_hollow_rect_mut(&mut annotated, rect, OUTLINE);
        }

        let main = frame.derive(annotated.into_raw(), FrameFormat::Rgb24);
        let mask_frame = frame.derive(mask.into_raw(), FrameFormat::Gray8);
        self.last_blobs = blobs;

        Ok(ProcessedOutput::new(main).with_debug(THRESHOLD_CHANNEL, mask_frame))
    }
}

/// 8-bit HSV with hue scaled to 0..=255
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let s = if max == 0 {
        0.0
    } else {
        255.0 * delta / max as f32
    };

    let h = if delta == 0.0 {
        0.0
    } else {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let degrees = if max as f32 == r {
            60.0 * ((g - b) / delta)
        } else if max as f32 == g {
            60.0 * ((b - r) / delta) + 120.0
        } else {
            60.0 * ((r - g) / delta) + 240.0
        };
        degrees.rem_euclid(360.0) * 255.0 / 360.0
    };

    (h.round().min(255.0) as u8, s.round() as u8, max)
}

/// Bounding boxes of the 4-connected regions of non-zero mask pixels,
/// in label order
fn find_blobs(mask: &GrayImage) -> Vec<Blob> {
    let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));
    let mut regions: BTreeMap<u32, Blob> = BTreeMap::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }

        let blob = regions.entry(label).or_insert(Blob {
            x,
            y,
            width: 1,
            height: 1,
            area: 0,
        });
        let (x1, y1) = (
            (blob.x + blob.width - 1).max(x),
            (blob.y + blob.height - 1).max(y),
        );
        blob.x = blob.x.min(x);
        blob.y = blob.y.min(y);
        blob.width = x1 - blob.x + 1;
        blob.height = y1 - blob.y + 1;
        blob.area += 1;
    }

    regions.into_values().collect()
}
