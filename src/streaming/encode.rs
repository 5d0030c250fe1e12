use crate::error::StreamError;
use crate::frame::{FrameData, FrameFormat};
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use tracing::trace;

/// Encode `frame` as JPEG at `quality` (1-100). MJPEG frames pass through.
pub fn encode_jpeg(frame: &FrameData, quality: u8) -> Result<Vec<u8>, StreamError> {
    let color = match frame.format {
        FrameFormat::Mjpeg => return Ok(frame.data.as_ref().clone()),
        FrameFormat::Rgb24 => ColorType::Rgb8,
        FrameFormat::Gray8 => ColorType::L8,
    };

    if !frame.validate_size() {
        return Err(StreamError::Encode {
            frame_id: frame.id,
            details: format!(
                "{} bytes for {}x{} {:?}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.format
            ),
        });
    }

    let mut buf = Vec::with_capacity(frame.data.len() / 8);
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .encode(&frame.data, frame.width, frame.height, color)
        .map_err(|e| StreamError::Encode {
            frame_id: frame.id,
            details: e.to_string(),
        })?;

    trace!(
        "Encoded frame {} at quality {} ({} bytes)",
        frame.id,
        quality,
        buf.len()
    );
    Ok(buf)
}
