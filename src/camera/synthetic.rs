use super::source::CameraSource;
use crate::error::{CameraError, CaptureError};
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use std::time::{Duration, SystemTime};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, trace};

const SQUARE: u32 = 32;

/// Test-pattern source paced at the configured frame rate.
///
/// Frames are a gray gradient with a red square sweeping across it, which
/// gives the color threshold processor something to find.
pub struct SyntheticCamera {
    name: String,
    fps: u32,
    resolution: (u32, u32),
    ticker: Option<Interval>,
    next_id: u64,
    closed: bool,
}

impl SyntheticCamera {
    pub fn new(name: &str, fps: u32) -> Self {
        Self {
            name: name.to_string(),
            fps: fps.max(1),
            resolution: (640, 480),
            ticker: None,
            next_id: 0,
            closed: false,
        }
    }

    fn render(&self, id: u64) -> Vec<u8> {
        let (width, height) = self.resolution;
        let mut data = Vec::with_capacity((width * height * 3) as usize);

        let span = width.saturating_sub(SQUARE).max(1) as u64;
        let square_x = (id * 4 % span) as u32;
        let square_y = height.saturating_sub(SQUARE) / 2;

        for y in 0..height {
            for x in 0..width {
                let inside = x >= square_x
                    && x < square_x + SQUARE
                    && y >= square_y
                    && y < square_y + SQUARE;
                if inside {
                    data.extend_from_slice(&[255, 0, 0]);
                } else {
                    let shade = (x * 255 / width.max(1)) as u8;
                    data.extend_from_slice(&[shade, shade, shade]);
                }
            }
        }

        data
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::Configuration {
                details: format!("invalid resolution {}x{}", width, height),
            });
        }
        debug!("Synthetic camera {} resolution {}x{}", self.name, width, height);
        self.resolution = (width, height);
        Ok(())
    }

    async fn start(&mut self) -> Result<(), CameraError> {
        if self.ticker.is_some() {
            return Ok(());
        }

        let mut ticker = interval(Duration::from_micros(1_000_000 / self.fps as u64));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
        self.closed = false;

        info!("Synthetic camera {} started at {}fps", self.name, self.fps);
        Ok(())
    }

    async fn capture(&mut self, timeout: Duration) -> Result<FrameData, CaptureError> {
        if self.closed {
            return Err(CaptureError::Closed);
        }

        let ticker = self.ticker.as_mut().ok_or_else(|| CaptureError::Stream {
            details: "capture before start".to_string(),
        })?;

        tokio::time::timeout(timeout, ticker.tick())
            .await
            .map_err(|_| CaptureError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })?;

        let id = self.next_id;
        self.next_id += 1;
        let (width, height) = self.resolution;

        trace!("Synthetic camera {} frame {}", self.name, id);
        Ok(FrameData::new(
            id,
            SystemTime::now(),
            self.render(id),
            width,
            height,
            FrameFormat::Rgb24,
        ))
    }

    async fn close(&mut self) {
        if !self.closed {
            info!("Synthetic camera {} closed", self.name);
        }
        self.ticker = None;
        self.closed = true;
    }
}
