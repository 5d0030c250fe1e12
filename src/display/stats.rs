use std::time::SystemTime;

/// Counters kept by the display thread
#[derive(Debug, Clone, Default)]
pub struct DisplayStats {
    pub windows_created: u64,
    pub frames_rendered: u64,
    pub render_errors: u64,
    pub last_frame_time: Option<SystemTime>,
}

impl DisplayStats {
    pub fn record_window_created(&mut self) {
        self.windows_created += 1;
    }

    pub fn record_frame_render(&mut self) {
        self.frames_rendered += 1;
        self.last_frame_time = Some(SystemTime::now());
    }

    pub fn record_render_error(&mut self) {
        self.render_errors += 1;
    }

    pub fn render_success_rate(&self) -> f64 {
        let attempts = self.frames_rendered + self.render_errors;
        if attempts == 0 {
            0.0
        } else {
            self.frames_rendered as f64 / attempts as f64
        }
    }
}
