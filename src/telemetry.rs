//! Logging setup and error capture.
//!
//! DESIGN
//! ======
//! Structured logs go through `tracing`. Exception capture is a separate
//! seam (`ErrorReporter`) so failures can be forwarded to an external sink
//! with tags while the original error keeps propagating to the caller.

use std::sync::{Arc, Mutex};

use crate::config::TelemetryConfig;
use crate::error::ErrorCode;

/// Install the global fmt subscriber. Call once from `main`.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

/// A single key/value tag attached to a captured error.
pub type Tag = (&'static str, String);

/// Sink for captured errors. Capture never replaces normal propagation.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, err: &dyn ErrorCode, tags: &[Tag]);
}

/// Reporter that emits captured errors as `tracing` events.
///
/// When a DSN is configured its host is attached to every event so log
/// shippers can route them to the matching project.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    sink: Option<String>,
}

impl TracingReporter {
    #[must_use]
    pub fn new(config: &TelemetryConfig) -> Self {
        Self { sink: config.dsn.as_deref().map(dsn_host) }
    }

    #[must_use]
    pub fn sink(&self) -> Option<&str> {
        self.sink.as_deref()
    }
}

impl ErrorReporter for TracingReporter {
    fn capture(&self, err: &dyn ErrorCode, tags: &[Tag]) {
        let tags = format_tags(tags);
        tracing::error!(
            code = err.error_code(),
            kind = %err.kind(),
            sink = self.sink.as_deref().unwrap_or("local"),
            tags = %tags,
            error = %err,
            "captured error"
        );
    }
}

/// Strip scheme, credentials and path from a DSN, keeping only the host.
fn dsn_host(dsn: &str) -> String {
    let without_scheme = dsn.split_once("://").map_or(dsn, |(_, rest)| rest);
    let without_creds = without_scheme
        .rsplit_once('@')
        .map_or(without_scheme, |(_, rest)| rest);
    without_creds
        .split('/')
        .next()
        .unwrap_or(without_creds)
        .to_owned()
}

fn format_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Captured error as stored by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub code: &'static str,
    pub message: String,
    pub tags: Vec<(String, String)>,
}

/// Reporter that keeps captured errors in memory. Useful in tests and for
/// surfacing recent failures on a diagnostics page.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    captured: Arc<Mutex<Vec<CapturedError>>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn captured(&self) -> Vec<CapturedError> {
        self.captured
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ErrorReporter for MemoryReporter {
    fn capture(&self, err: &dyn ErrorCode, tags: &[Tag]) {
        let entry = CapturedError {
            code: err.error_code(),
            message: err.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        };
        self.captured
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(entry);
    }
}
