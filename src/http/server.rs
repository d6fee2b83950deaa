//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all gateway handler
//! - Wire up middleware (request ID, tracing, timeout, error boundary, auth)
//! - Bind server to listener
//! - Dispatch requests to the route resolver and forwarder
//!
//! # Layer Order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → Timeout
//!     → CatchPanic → error_boundary → auth → proxy_handler
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware,
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{auth_middleware, CryptoError, TokenCipher, TokenSecrets, TokenValidator};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::boundary::{error_boundary, PanicBoundary};
use crate::http::client::build_client;
use crate::http::forward::Forwarder;
use crate::lifecycle::shutdown;
use crate::observability::RemoteLogSink;
use crate::routing::RouteTable;

/// Inbound header selecting a versioned route group.
pub const VERSION_HEADER: HeaderName = HeaderName::from_static("version");

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid token key material: {0}")]
    KeyMaterial(#[from] CryptoError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Forwarder,
    pub sink: RemoteLogSink,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server from validated configuration and a route table.
    pub fn new(
        config: GatewayConfig,
        routes: RouteTable,
        sink: RemoteLogSink,
    ) -> Result<Self, ServerError> {
        let client = build_client(&config.upstream)?;
        let validator = if config.auth.enabled {
            let cipher = TokenCipher::new(&TokenSecrets::from(&config.auth))?;
            Some(Arc::new(TokenValidator::new(cipher)))
        } else {
            tracing::warn!("Token validation is disabled");
            None
        };

        let state = AppState {
            routes: Arc::new(routes),
            forwarder: Forwarder::new(client, sink.clone(), &config.upstream),
            sink,
        };

        let router = Self::build_router(&config, state, validator);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        validator: Option<Arc<TokenValidator>>,
    ) -> Router {
        let mut router: Router<AppState> = Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler));

        if let Some(validator) = validator {
            router = router.layer(middleware::from_fn_with_state(validator, auth_middleware));
        }

        router
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state.sink.clone(), error_boundary))
            .layer(CatchPanicLayer::custom(PanicBoundary::new(state.sink)))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for serving or for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            auth = self.config.auth.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gateway handler.
/// Resolves the route for the request and forwards it.
async fn proxy_handler(
    State(state): State<AppState>,
    mut request: Request<Body>,
) -> Result<Response, GatewayError> {
    let path = request.uri().path().to_owned();
    let version = request
        .headers()
        .get(VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let Some(route) = state.routes.resolve(&path, version.as_deref()) else {
        let err = GatewayError::RouteNotFound { path, version };
        let message = err.to_string();
        tracing::warn!(error = %message, "No route matched");
        state.sink.log(Some(&message), &message);
        return Err(err);
    };

    tracing::debug!(
        path_prefix = %route.path_prefix(),
        target = %route.target_base_uri(),
        version = version.as_deref().unwrap_or(""),
        "Route matched"
    );

    state.forwarder.forward(route, &mut request).await
}
