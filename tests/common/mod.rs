//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use lp_gateway::auth::{TokenCipher, TokenSecrets};
use lp_gateway::config::GatewayConfig;
use lp_gateway::observability::{LogRecord, RemoteLogSink};
use lp_gateway::{GatewayServer, RouteTable, Shutdown};

/// Key material used by the existing token producers.
pub fn legacy_secrets() -> TokenSecrets {
    TokenSecrets {
        passphrase: "rj11fxc8$".into(),
        salt: "uwts247$".into(),
        iterations: 2,
        init_vector: "@1B2c3D4e5F6g7H8".into(),
    }
}

pub fn lp_token(payload: &str) -> String {
    TokenCipher::new(&legacy_secrets()).unwrap().encrypt(payload)
}

/// Gateway config with legacy key material and remote logging enabled.
pub fn test_config() -> GatewayConfig {
    let secrets = legacy_secrets();
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.passphrase = secrets.passphrase;
    config.auth.salt = secrets.salt;
    config.auth.iterations = secrets.iterations;
    config.auth.init_vector = secrets.init_vector;
    config.remote_log.environment = "test".into();
    config.remote_log.api_base_url = "http://127.0.0.1:9".into();
    config.upstream.connect_timeout_secs = 2;
    config.upstream.request_timeout_secs = 5;
    config
}

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockBackend {
    pub fn base_uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

/// Start a backend that records every request and answers with a fixed
/// status and body.
pub async fn start_programmable_backend(status: u16, body: &'static str) -> MockBackend {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let handler = move |request: Request<Body>| {
        let sink = sink.clone();
        async move {
            let (parts, body_in) = request.into_parts();
            let bytes = axum::body::to_bytes(body_in, usize::MAX).await.unwrap();
            sink.lock().unwrap().push(Captured {
                method: parts.method.to_string(),
                path_and_query: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_default(),
                headers: parts.headers,
                body: bytes,
            });
            (
                StatusCode::from_u16(status).unwrap(),
                [("x-backend", "mock")],
                body,
            )
        }
    };

    let app = Router::new()
        .route("/", any(handler.clone()))
        .route("/{*path}", any(handler));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, captured }
}

/// Start a backend that answers 200 at once, then sends each chunk of
/// its body after waiting `gap`.
pub async fn start_streaming_backend(chunks: Vec<&'static str>, gap: Duration) -> MockBackend {
    let handler = move || {
        let chunks = chunks.clone();
        async move {
            let stream = futures_util::stream::unfold(chunks.into_iter(), move |mut rest| async move {
                let chunk = rest.next()?;
                tokio::time::sleep(gap).await;
                Some((Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())), rest))
            });
            Body::from_stream(stream)
        }
    };

    let app = Router::new().route("/{*path}", any(handler));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        addr,
        captured: Arc::new(Mutex::new(Vec::new())),
    }
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub records: mpsc::Receiver<LogRecord>,
    pub shutdown: Shutdown,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Drain every record emitted so far.
    pub fn take_records(&mut self) -> Vec<LogRecord> {
        let mut out = Vec::new();
        while let Ok(record) = self.records.try_recv() {
            out.push(record);
        }
        out
    }
}

/// Serve a gateway on an ephemeral port; its log records are captured
/// instead of shipped.
pub async fn start_gateway(config: GatewayConfig, routes: RouteTable) -> RunningGateway {
    let (sink, records) = RemoteLogSink::channel(&config.remote_log);
    let server = GatewayServer::new(config, routes, sink).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningGateway {
        addr,
        records,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
