use super::backend::{DisplayBackend, DisplayWindow};
use super::stats::DisplayStats;
use crate::error::DisplayError;
use crate::frame::FrameData;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// What a show request did to its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUpdate {
    Created,
    Updated,
}

enum DisplayTask {
    Open {
        name: String,
        ack: oneshot::Sender<Result<WindowUpdate, DisplayError>>,
    },
    Show {
        name: String,
        frame: FrameData,
        ack: oneshot::Sender<Result<WindowUpdate, DisplayError>>,
    },
    Stop,
}

/// Handle to the thread that owns every window.
///
/// All window work runs on one OS thread draining a single-consumer queue, so
/// two callers racing to show a new window name always produce exactly one
/// window: whichever request is dequeued first creates it and the other one
/// updates it. Callers wait for their request to finish before returning.
#[derive(Clone)]
pub struct DisplayContext {
    tasks: Sender<DisplayTask>,
    stats: Arc<Mutex<DisplayStats>>,
}

impl DisplayContext {
    /// Start the display thread, moving `backend` onto it
    pub fn spawn(backend: Box<dyn DisplayBackend>) -> Result<Self, DisplayError> {
        let (tasks, queue) = unbounded();
        let stats = Arc::new(Mutex::new(DisplayStats::default()));

        let thread_stats = Arc::clone(&stats);
        thread::Builder::new()
            .name("display".to_string())
            .spawn(move || run_display_thread(backend, queue, thread_stats))
            .map_err(DisplayError::ThreadSpawn)?;

        info!("Display thread started");
        Ok(Self { tasks, stats })
    }

    /// Create `name` if it does not exist yet, without drawing anything
    pub async fn open(&self, name: &str) -> Result<WindowUpdate, DisplayError> {
        let (ack, done) = oneshot::channel();
        self.submit(
            DisplayTask::Open {
                name: name.to_string(),
                ack,
            },
            done,
        )
        .await
    }

    /// Show `frame` in window `name`, creating the window on first use
    pub async fn show(&self, name: &str, frame: FrameData) -> Result<WindowUpdate, DisplayError> {
        let (ack, done) = oneshot::channel();
        self.submit(
            DisplayTask::Show {
                name: name.to_string(),
                frame,
                ack,
            },
            done,
        )
        .await
    }

    /// Ask the display thread to drop its windows and exit
    pub fn stop(&self) {
        if self.tasks.send(DisplayTask::Stop).is_err() {
            debug!("Display thread already stopped");
        }
    }

    pub fn stats(&self) -> DisplayStats {
        self.stats.lock().clone()
    }

    async fn submit(
        &self,
        task: DisplayTask,
        done: oneshot::Receiver<Result<WindowUpdate, DisplayError>>,
    ) -> Result<WindowUpdate, DisplayError> {
        self.tasks
            .send(task)
            .map_err(|_| DisplayError::ContextClosed)?;
        done.await.map_err(|_| DisplayError::ContextClosed)?
    }
}

fn run_display_thread(
    mut backend: Box<dyn DisplayBackend>,
    queue: Receiver<DisplayTask>,
    stats: Arc<Mutex<DisplayStats>>,
) {
    let mut windows: HashMap<String, Box<dyn DisplayWindow>> = HashMap::new();

    for task in queue.iter() {
        match task {
            DisplayTask::Open { name, ack } => {
                let result = ensure_window(backend.as_mut(), &mut windows, &stats, &name)
                    .map(|(update, _)| update);
                let _ = ack.send(result);
            }
            DisplayTask::Show { name, frame, ack } => {
                let result = ensure_window(backend.as_mut(), &mut windows, &stats, &name)
                    .and_then(|(update, window)| {
                        window.show(&frame).map(|_| update)
                    });

                match &result {
                    Ok(_) => stats.lock().record_frame_render(),
                    Err(e) => {
                        warn!("Failed to show frame {} in '{}': {}", frame.id, name, e);
                        stats.lock().record_render_error();
                    }
                }
                let _ = ack.send(result);
            }
            DisplayTask::Stop => break,
        }
    }

    info!("Display thread stopping ({} windows)", windows.len());
}

fn ensure_window<'a>(
    backend: &mut dyn DisplayBackend,
    windows: &'a mut HashMap<String, Box<dyn DisplayWindow>>,
    stats: &Mutex<DisplayStats>,
    name: &str,
) -> Result<(WindowUpdate, &'a mut Box<dyn DisplayWindow>), DisplayError> {
    let update = if windows.contains_key(name) {
        WindowUpdate::Updated
    } else {
        let window = backend.create_window(name).map_err(|e| {
            error!("Failed to create window '{}': {}", name, e);
            e
        })?;
        windows.insert(name.to_string(), window);
        stats.lock().record_window_created();
        info!("Created window '{}'", name);
        WindowUpdate::Created
    };

    windows
        .get_mut(name)
        .map(|window| (update, window))
        .ok_or(DisplayError::ContextClosed)
}
