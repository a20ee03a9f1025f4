//! Per-attempt audit hook

use crate::fetcher::transport::TransportError;

/// Receives one event per request attempt, retried attempts included
pub trait AttemptObserver: Send + Sync {
    /// An attempt produced an HTTP response
    fn on_response(&self, attempt: u32, status: u16, url: &str);

    /// An attempt failed before any response arrived
    fn on_transport_error(&self, attempt: u32, url: &str, error: &TransportError);
}

/// Observer that writes attempts to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn on_response(&self, attempt: u32, status: u16, url: &str) {
        tracing::info!(attempt, status, url, "Response: {} {}", status, url);
    }

    fn on_transport_error(&self, attempt: u32, url: &str, error: &TransportError) {
        tracing::warn!(attempt, url, "Request error: {}", error);
    }
}
