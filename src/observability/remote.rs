//! Remote log delivery.
//!
//! # Responsibilities
//! - Build [`LogRecord`]s stamped with environment, project and app name
//! - Hand them to a background shipper without waiting
//! - POST them to `{api_base_url}/add-log`
//!
//! # Design Decisions
//! - Bounded queue between request handlers and one shipper task
//! - Backpressure policy is drop-newest: a full queue rejects the new
//!   record, which is counted and reported locally
//! - Delivery failures go to the local tracing output and nowhere else
//! - Disabled entirely when the environment is `local`
//! - On shutdown the shipper drains what is already queued, then exits

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::RemoteLogConfig;
use crate::observability::metrics;

/// Severity carried in the record's `Type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Error,
    Warning,
}

/// One log event as accepted by the collector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub environment: String,
    pub project: String,
    #[serde(rename = "app_name")]
    pub app_name: String,
    #[serde(rename = "Type")]
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct SinkInner {
    environment: String,
    project: String,
    app_name: String,
    tx: Option<mpsc::Sender<LogRecord>>,
}

/// Cheap-to-clone handle used by request handlers to emit records.
#[derive(Clone)]
pub struct RemoteLogSink {
    inner: Arc<SinkInner>,
}

impl std::fmt::Debug for RemoteLogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLogSink")
            .field("environment", &self.inner.environment)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl RemoteLogSink {
    /// Create a sink and the receiving end of its queue.
    ///
    /// When the configured environment is local the sink never enqueues.
    pub fn channel(config: &RemoteLogConfig) -> (Self, mpsc::Receiver<LogRecord>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let sink = Self {
            inner: Arc::new(SinkInner {
                environment: config.environment.clone(),
                project: config.project.clone(),
                app_name: config.app_name.clone(),
                tx: config.is_enabled().then_some(tx),
            }),
        };
        (sink, rx)
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(SinkInner {
                environment: String::new(),
                project: String::new(),
                app_name: String::new(),
                tx: None,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.tx.is_some()
    }

    /// Emit an error-level record.
    pub fn log(&self, error: Option<&str>, message: &str) {
        self.record(LogLevel::Error, error, message);
    }

    /// Emit a warning-level record.
    pub fn warn(&self, error: Option<&str>, message: &str) {
        self.record(LogLevel::Warning, error, message);
    }

    pub fn record(&self, level: LogLevel, error: Option<&str>, message: &str) {
        let Some(tx) = &self.inner.tx else {
            return;
        };

        let record = LogRecord {
            timestamp: Local::now(),
            environment: self.inner.environment.clone(),
            project: self.inner.project.clone(),
            app_name: self.inner.app_name.clone(),
            level,
            message: message.to_string(),
            error: error.map(str::to_string),
        };

        match tx.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                metrics::record_remote_log_dropped();
                tracing::warn!(message = %record.message, "Remote log queue full, dropping record");
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                tracing::debug!(message = %record.message, "Remote log shipper stopped, dropping record");
            }
        }
    }
}

/// Background task delivering queued records to the collector.
pub struct LogShipper {
    client: reqwest::Client,
    endpoint: String,
    rx: mpsc::Receiver<LogRecord>,
}

impl LogShipper {
    pub fn new(config: &RemoteLogConfig, rx: mpsc::Receiver<LogRecord>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.delivery_timeout_secs))
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            endpoint: add_log_endpoint(&config.api_base_url),
            rx,
        })
    }

    /// Deliver records until the queue closes or shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(endpoint = %self.endpoint, "Remote log shipper started");
        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(record) => self.deliver(&record).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.rx.close();
                    while let Some(record) = self.rx.recv().await {
                        self.deliver(&record).await;
                    }
                    break;
                }
            }
        }
        tracing::info!("Remote log shipper stopped");
    }

    async fn deliver(&self, record: &LogRecord) {
        match self.client.post(&self.endpoint).json(record).send().await {
            Ok(response) if response.status().is_server_error() => {
                tracing::error!(
                    status = %response.status(),
                    message = %record.message,
                    "Remote log collector returned server error"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    message = %record.message,
                    "Failed to deliver log record"
                );
            }
        }
    }
}

fn add_log_endpoint(base: &str) -> String {
    format!("{}/add-log", base.trim_end_matches('/'))
}

/// Create the sink and, when enabled, start its shipper.
pub fn start(
    config: &RemoteLogConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(RemoteLogSink, Option<JoinHandle<()>>), reqwest::Error> {
    let (sink, rx) = RemoteLogSink::channel(config);
    if !sink.is_enabled() {
        tracing::info!(environment = %config.environment, "Remote logging disabled");
        return Ok((sink, None));
    }
    let shipper = LogShipper::new(config, rx)?;
    let handle = tokio::spawn(shipper.run(shutdown));
    Ok((sink, Some(handle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str, capacity: usize) -> RemoteLogConfig {
        RemoteLogConfig {
            environment: environment.into(),
            project: "lp".into(),
            app_name: "gateway".into(),
            api_base_url: "http://collector.internal/".into(),
            queue_capacity: capacity,
            delivery_timeout_secs: 1,
        }
    }

    #[test]
    fn test_local_environment_never_enqueues() {
        let (sink, mut rx) = RemoteLogSink::channel(&config("Local", 4));
        assert!(!sink.is_enabled());
        sink.log(Some("boom"), "message");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_record_fields() {
        let (sink, mut rx) = RemoteLogSink::channel(&config("production", 4));
        sink.warn(None, "Downstream service returned 5xx error.");
        let record = rx.try_recv().unwrap();
        assert_eq!(record.level, LogLevel::Warning);
        assert_eq!(record.environment, "production");
        assert_eq!(record.project, "lp");
        assert_eq!(record.app_name, "gateway");
        assert!(record.error.is_none());
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (sink, mut rx) = RemoteLogSink::channel(&config("production", 1));
        sink.log(None, "first");
        sink.log(None, "second");
        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_wire_format() {
        let (sink, mut rx) = RemoteLogSink::channel(&config("production", 4));
        sink.log(Some("connection refused"), "Error forwarding request to downstream service.");
        let json = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["Environment", "Error", "Message", "Project", "Timestamp", "Type", "app_name"]
        );
        assert_eq!(object["Type"], "Error");
        assert_eq!(object["Error"], "connection refused");
    }

    #[test]
    fn test_absent_error_omitted() {
        let (sink, mut rx) = RemoteLogSink::channel(&config("production", 4));
        sink.log(None, "no error");
        let json = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert!(json.get("Error").is_none());
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(add_log_endpoint("http://collector.internal/"), "http://collector.internal/add-log");
        assert_eq!(add_log_endpoint("http://collector.internal/api"), "http://collector.internal/api/add-log");
    }

    #[test]
    fn test_disabled_sink() {
        let sink = RemoteLogSink::disabled();
        assert!(!sink.is_enabled());
        sink.log(None, "ignored");
    }
}
