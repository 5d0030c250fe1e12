use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Packed 8-bit RGB
    Rgb24,
    /// Single 8-bit channel (masks, grayscale debug output)
    Gray8,
    /// Motion JPEG format - compressed JPEG frames
    Mjpeg,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Rgb24 => 3,
            FrameFormat::Gray8 => 1,
            FrameFormat::Mjpeg => 0, // Variable size, compressed
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, FrameFormat::Mjpeg)
    }
}

/// Immutable captured or processed image
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Frame identifier, monotonically increasing per camera
    pub id: u64,
    /// Timestamp when the source frame was captured
    pub timestamp: SystemTime,
    /// Pixel data (shared, never mutated after construction)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame format
    pub format: FrameFormat,
}

impl FrameData {
    /// Create a new frame data instance
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Build a frame derived from this one (same id and timestamp)
    pub fn derive(&self, data: Vec<u8>, format: FrameFormat) -> Self {
        Self::new(
            self.id,
            self.timestamp,
            data,
            self.width,
            self.height,
            format,
        )
    }

    /// Get the expected frame size for uncompressed formats
    pub fn expected_size(&self) -> Option<usize> {
        if self.format.is_compressed() {
            None
        } else {
            Some(self.width as usize * self.height as usize * self.format.bytes_per_pixel())
        }
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        match self.expected_size() {
            Some(expected) => self.data.len() == expected,
            None => true,
        }
    }

    /// Get frame age in milliseconds
    pub fn age_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Copy `height` rows of `row_len` bytes out of a buffer whose rows start
/// every `stride` bytes. Returns `None` when the buffer is too short.
pub fn pack_rows(bytes: &[u8], row_len: usize, stride: usize, height: usize) -> Option<Vec<u8>> {
    if height == 0 || stride < row_len {
        return None;
    }
    let needed = stride * (height - 1) + row_len;
    if bytes.len() < needed {
        return None;
    }

    if stride == row_len {
        return Some(bytes[..row_len * height].to_vec());
    }

    let mut packed = Vec::with_capacity(row_len * height);
    for line in bytes.chunks(stride).take(height) {
        packed.extend_from_slice(&line[..row_len]);
    }
    Some(packed)
}
