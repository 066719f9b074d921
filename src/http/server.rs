//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Build the shared bridge state (registry, correlation engine, upstream)
//! - Serve until shutdown

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::bridge::{ConnectionRegistry, CorrelationEngine, PostMineAction, Publisher, ReplyCollector};
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::upstream::Upstream;
use crate::http::{anki, asbplayer, status, websocket};
use crate::lifecycle::shutdown::wait_for_signal;
use crate::observability::logging;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub engine: CorrelationEngine,
    pub upstream: Arc<Upstream>,
    pub post_mine_action: PostMineAction,
}

impl AppState {
    /// Wire the bridge components for `config`.
    pub fn new(config: &BridgeConfig) -> BridgeResult<Self> {
        let registry = Arc::new(ConnectionRegistry::new());
        let engine = CorrelationEngine::new(
            Publisher::new(Arc::clone(&registry)),
            ReplyCollector::new(),
            Duration::from_millis(config.correlation.reply_timeout_ms),
        );
        let upstream = Arc::new(Upstream::new(&config.upstream)?);

        Ok(Self {
            registry,
            engine,
            upstream,
            post_mine_action: config.mining.post_mine_action,
        })
    }
}

/// HTTP server for the bridge.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        let state = AppState::new(&config)?;
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BridgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/ws", get(websocket::ws_upgrade))
            .route(
                "/",
                get(anki::passthrough)
                    .post(anki::handle_post)
                    .options(anki::preflight),
            )
            .route("/asbplayer/load-subtitles", post(asbplayer::load_subtitles))
            .route("/asbplayer/seek", post(asbplayer::seek))
            .route("/bridge/status", get(status::get_status))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            // Outermost first: the ID must exist before the span is created.
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(logging::make_request_span::<Body>)
                            .on_response(logging::on_response::<Body>),
                    )
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.state.upstream.uri(),
            post_mine_action = u8::from(self.state.post_mine_action),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
