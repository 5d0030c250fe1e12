use super::encode::encode_jpeg;
use super::stats::{StreamCounters, StreamStats};
use crate::display::{DisplayContext, MAIN_WINDOW};
use crate::error::{DisplayError, StreamError};
use crate::frame::FrameData;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{watch, Mutex};
use tracing::{debug, trace};

/// Destination for encoded video
#[async_trait]
pub trait VideoStream: Send {
    /// Encode and publish one frame, returning the number of bytes written
    async fn write_frame(&mut self, frame: &FrameData, quality: u8) -> Result<usize, StreamError>;
}

/// One JPEG ready for MJPEG clients
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub id: u64,
    pub timestamp: SystemTime,
    pub jpeg: Bytes,
}

pub type FrameFeed = watch::Receiver<Option<EncodedFrame>>;

/// Publishes the newest JPEG to every connected MJPEG client
pub struct MjpegBroadcaster {
    latest: watch::Sender<Option<EncodedFrame>>,
}

impl MjpegBroadcaster {
    pub fn channel() -> (Self, FrameFeed) {
        let (latest, feed) = watch::channel(None);
        (Self { latest }, feed)
    }
}

#[async_trait]
impl VideoStream for MjpegBroadcaster {
    async fn write_frame(&mut self, frame: &FrameData, quality: u8) -> Result<usize, StreamError> {
        let jpeg = encode_jpeg(frame, quality)?;
        let size = jpeg.len();

        self.latest.send_replace(Some(EncodedFrame {
            id: frame.id,
            timestamp: frame.timestamp,
            jpeg: Bytes::from(jpeg),
        }));

        Ok(size)
    }
}

/// Where each loop's main output goes: the local main window and the
/// network stream.
///
/// Concurrent senders queue on the stream lock, so frames are never
/// interleaved. Quality set through [`set_quality`](OutputSink::set_quality)
/// applies from the next send on.
pub struct OutputSink {
    stream: Mutex<Box<dyn VideoStream>>,
    quality: AtomicU8,
    display: Option<DisplayContext>,
    counters: Arc<StreamCounters>,
}

impl OutputSink {
    pub fn new(
        stream: Box<dyn VideoStream>,
        display: Option<DisplayContext>,
        quality: u8,
        counters: Arc<StreamCounters>,
    ) -> Self {
        Self {
            stream: Mutex::new(stream),
            quality: AtomicU8::new(quality.clamp(1, 100)),
            display,
            counters,
        }
    }

    /// Show `frame` in the main window; no-op when headless
    pub async fn display(&self, frame: FrameData) -> Result<(), DisplayError> {
        match &self.display {
            Some(context) => context.show(MAIN_WINDOW, frame).await.map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn set_quality(&self, quality: u8) {
        let quality = quality.clamp(1, 100);
        let previous = self.quality.swap(quality, Ordering::Relaxed);
        if previous != quality {
            debug!("Stream quality {} -> {}", previous, quality);
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality.load(Ordering::Relaxed)
    }

    /// Encode and publish `frame` to the network stream
    pub async fn send(&self, frame: &FrameData) -> Result<(), StreamError> {
        let mut stream = self.stream.lock().await;
        let quality = self.quality();

        match stream.write_frame(frame, quality).await {
            Ok(bytes) => {
                trace!("Sent frame {} ({} bytes)", frame.id, bytes);
                self.counters.record_frame(bytes);
                Ok(())
            }
            Err(e) => {
                self.counters.record_failure();
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }
}
