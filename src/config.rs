use std::collections::BTreeMap;
use std::time::Duration;

/// How query options travel to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Options are flattened into the URL query string.
    QueryString,
    /// Options are JSON-serialized into the reserved options header and the
    /// URL stays bare. The header is authoritative server-side; any query
    /// parameters are ignored.
    Header,
}

/// Immutable pipeline configuration, created once and shared by every call.
#[derive(Debug, Clone, Default)]
pub struct HttpApiConfig {
    /// Process-wide transport-mode override. A per-call flag on the request
    /// descriptor takes precedence; with neither set, query-string delivery
    /// is the default.
    pub transport_mode: Option<TransportMode>,
    /// Optional request timeout applied by the transport.
    pub timeout: Option<Duration>,
    /// Headers merged into every request before hook-provided headers.
    pub extra_headers: BTreeMap<String, String>,
}

impl HttpApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport_mode(mut self, mode: TransportMode) -> Self {
        self.transport_mode = Some(mode);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}
