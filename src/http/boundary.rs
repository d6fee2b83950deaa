//! Error boundary.
//!
//! Outermost safety net of the request pipeline. Two halves:
//! - [`error_boundary`] middleware records failures that inner layers
//!   already turned into the 500 envelope (marked by [`UnhandledFailure`])
//! - [`PanicBoundary`] plugs into `CatchPanicLayer` and turns a panic into
//!   the same envelope
//!
//! Both log locally and to the remote log sink. Neither rethrows.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::ResponseForPanic;

use crate::error::{ErrorEnvelope, UnhandledFailure};
use crate::observability::{metrics, RemoteLogSink};

const UNHANDLED_MESSAGE: &str = "An unhandled exception occurred.";

/// Record unhandled failures and per-request metrics.
pub async fn error_boundary(
    State(sink): State<RemoteLogSink>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    if let Some(failure) = response.extensions().get::<UnhandledFailure>() {
        tracing::error!(method = %method, path = %path, error = %failure.detail, "{}", UNHANDLED_MESSAGE);
        sink.log(Some(&failure.detail), UNHANDLED_MESSAGE);
    }

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// `CatchPanicLayer` handler producing the 500 envelope.
#[derive(Clone)]
pub struct PanicBoundary {
    sink: RemoteLogSink,
}

impl PanicBoundary {
    pub fn new(sink: RemoteLogSink) -> Self {
        Self { sink }
    }
}

fn panic_detail(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

impl ResponseForPanic for PanicBoundary {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        let detail = panic_detail(err.as_ref());
        tracing::error!(error = %detail, "Panic while processing request");
        self.sink.log(Some(&detail), UNHANDLED_MESSAGE);
        ErrorEnvelope::internal(detail).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteLogConfig;
    use crate::observability::LogLevel;
    use axum::{http::StatusCode, routing::get, Router};
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    fn sink() -> (RemoteLogSink, tokio::sync::mpsc::Receiver<crate::observability::LogRecord>) {
        RemoteLogSink::channel(&RemoteLogConfig {
            environment: "test".into(),
            ..RemoteLogConfig::default()
        })
    }

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn test_panic_becomes_envelope() {
        let (sink, mut rx) = sink();
        let app = Router::new()
            .route("/", get(boom))
            .layer(CatchPanicLayer::custom(PanicBoundary::new(sink)));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": 500,
                "message": "Internal Server Error",
                "detail": "handler exploded"
            })
        );

        let record = rx.try_recv().unwrap();
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, UNHANDLED_MESSAGE);
        assert_eq!(record.error.as_deref(), Some("handler exploded"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_internal_error_recorded_once() {
        let (sink, mut rx) = sink();
        let app = Router::new()
            .route(
                "/",
                get(|| async { crate::error::GatewayError::Internal("bad target".into()) }),
            )
            .layer(axum::middleware::from_fn_with_state(sink, error_boundary));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let record = rx.try_recv().unwrap();
        assert_eq!(record.message, UNHANDLED_MESSAGE);
        assert_eq!(record.error.as_deref(), Some("bad target"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_panic_detail() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_detail(owned.as_ref()), "owned message");

        let borrowed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_detail(borrowed.as_ref()), "static message");

        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_detail(other.as_ref()), "Unknown panic");
    }
}
