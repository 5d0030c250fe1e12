use super::handlers::{health_handler, mjpeg_stream_handler, stream_page_handler};
use super::sink::FrameFeed;
use super::stats::StreamCounters;
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::params::{param_routes, SharedParameterStore};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for the Axum handlers
#[derive(Clone)]
pub struct ServerState {
    pub(crate) feed: FrameFeed,
    pub(crate) counters: Arc<StreamCounters>,
}

/// Build the HTTP routes: viewer page, MJPEG stream, health and, when a
/// store is given, the parameter control surface
pub fn build_router(state: ServerState, params: Option<SharedParameterStore>) -> Router {
    let mut app = Router::new()
        .route("/", get(stream_page_handler))
        .route("/stream.mjpg", get(mjpeg_stream_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    if let Some(store) = params {
        app = app.merge(param_routes(store));
    }

    app.layer(TraceLayer::new_for_http())
}

/// MJPEG server with its listening socket already bound.
///
/// Binding happens in [`VideoServer::bind`] so that a port conflict surfaces
/// during startup rather than inside a background task.
pub struct VideoServer {
    listener: TcpListener,
    app: Router,
    address: SocketAddr,
}

impl VideoServer {
    pub async fn bind(
        config: &StreamConfig,
        feed: FrameFeed,
        counters: Arc<StreamCounters>,
        params: Option<SharedParameterStore>,
    ) -> Result<Self, StreamError> {
        let addr = format!("{}:{}", config.ip, config.port);
        info!("Starting MJPEG streaming server on {}", addr);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| StreamError::BindFailed {
                address: addr.clone(),
                source: e,
            })?;
        let address = listener.local_addr().map_err(|e| StreamError::BindFailed {
            address: addr,
            source: e,
        })?;

        let app = build_router(ServerState { feed, counters }, params);

        info!("MJPEG server listening on {}", address);
        Ok(Self {
            listener,
            app,
            address,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Serve until `cancel` fires
    pub async fn serve(self, cancel: CancellationToken) -> Result<(), StreamError> {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .map_err(|e| StreamError::Server {
                details: format!("Server error: {}", e),
            })?;

        info!("MJPEG server on {} stopped", self.address);
        Ok(())
    }
}
