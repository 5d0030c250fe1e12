use super::server::ServerState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

use super::stats::StreamCounters;

/// Decrements the active client count when the response stream is dropped
struct ClientGuard(Arc<StreamCounters>);

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.0.client_disconnected();
        info!("MJPEG stream client disconnected");
    }
}

/// Handler for the MJPEG streaming endpoint
pub async fn mjpeg_stream_handler(State(state): State<ServerState>) -> impl IntoResponse {
    info!("New MJPEG stream client connected");
    state.counters.client_connected();

    let mut feed = state.feed.clone();
    let guard = ClientGuard(Arc::clone(&state.counters));

    let stream = async_stream::stream! {
        let _guard = guard;

        loop {
            let latest = feed.borrow_and_update().clone();

            if let Some(frame) = latest {
                let part_header = format!(
                    "--FRAME\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nX-Frame-ID: {}\r\nX-Timestamp: {}\r\n\r\n",
                    frame.jpeg.len(),
                    frame.id,
                    frame.timestamp.duration_since(UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis()
                );

                yield Ok::<_, axum::Error>(Bytes::from(part_header));
                yield Ok(frame.jpeg);
                yield Ok(Bytes::from_static(b"\r\n"));
            }

            if feed.changed().await.is_err() {
                debug!("Frame feed closed; ending MJPEG stream");
                break;
            }
        }
    };

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "multipart/x-mixed-replace; boundary=FRAME",
            ),
            (header::CACHE_CONTROL, "no-cache, private"),
            (header::PRAGMA, "no-cache"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Body::from_stream(stream),
    )
}

/// Handler for the health check endpoint
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let latest_frame_id = state.feed.borrow().as_ref().map(|frame| frame.id);

    let health_info = serde_json::json!({
        "status": "healthy",
        "frames_available": latest_frame_id.is_some(),
        "latest_frame_id": latest_frame_id,
        "stream": state.counters.snapshot(),
    });

    (StatusCode::OK, Json(health_info))
}

/// Minimal viewer page for the MJPEG stream
pub async fn stream_page_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Vision Pipeline</title>
    <style>
        body { margin: 0; background: #000; display: flex; align-items: center; justify-content: center; min-height: 100vh; }
        img { max-width: 100vw; max-height: 100vh; object-fit: contain; }
    </style>
</head>
<body>
    <img src="/stream.mjpg" alt="Processed stream">
</body>
</html>
"#,
    )
}
