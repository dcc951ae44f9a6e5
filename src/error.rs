//! Error types for source adapters and the fallback orchestrator.

use thiserror::Error;

/// Failure reported by a single source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Required credentials or endpoint are missing.
    #[error("{adapter} is not configured: {message}")]
    NotConfigured { adapter: String, message: String },

    /// Network failure or a non-success response from the upstream.
    #[error("{adapter} upstream unavailable: {message}")]
    UpstreamUnavailable { adapter: String, message: String },

    /// The upstream answered, but not in the expected shape.
    #[error("{adapter} returned an unexpected response: {message}")]
    UpstreamProtocolError { adapter: String, message: String },
}

impl AdapterError {
    pub fn not_configured(adapter: &str, message: impl Into<String>) -> Self {
        Self::NotConfigured {
            adapter: adapter.to_string(),
            message: message.into(),
        }
    }

    pub fn unavailable(adapter: &str, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            adapter: adapter.to_string(),
            message: message.into(),
        }
    }

    pub fn protocol(adapter: &str, message: impl Into<String>) -> Self {
        Self::UpstreamProtocolError {
            adapter: adapter.to_string(),
            message: message.into(),
        }
    }

    /// Machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::NotConfigured { .. } => "not_configured",
            AdapterError::UpstreamUnavailable { .. } => "upstream_unavailable",
            AdapterError::UpstreamProtocolError { .. } => "upstream_protocol_error",
        }
    }
}

/// Terminal failure of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Every source was tried and the generative fallback failed too.
    #[error("all sources exhausted: {source}")]
    AllSourcesExhausted {
        #[source]
        source: AdapterError,
    },
}

/// Result type for adapter calls.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Parse a configured upstream endpoint; blank or malformed means unset.
pub(crate) fn parse_endpoint(raw: &str) -> Option<reqwest::Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    reqwest::Url::parse(raw).ok()
}

/// Cap an upstream body quoted in an error message at `max_chars`.
pub(crate) fn truncate_body(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
