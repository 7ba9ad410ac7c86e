use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Other,
}

/// Coarse classification used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced an HTTP response.
    NoResponse,
    /// The backend answered 404; for session endpoints this means the
    /// session is gone.
    NotFound,
    /// 5xx.
    ServerFault,
    /// Anything else: 4xx, undecodable bodies, client setup problems.
    Rejected,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(String),

    #[error("failed to load config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("request to {endpoint} failed without a response ({kind:?}): {message}")]
    Transport {
        endpoint: String,
        kind: TransportKind,
        message: String,
    },

    #[error("{endpoint} returned {status}")]
    Http {
        endpoint: String,
        status: StatusCode,
        /// The backend's `detail` field, when it sent one.
        detail: Option<String>,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ClientError {
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        };
        Self::Transport {
            endpoint: endpoint.to_string(),
            kind,
            message: err.to_string(),
        }
    }

    pub(crate) fn from_status(endpoint: &str, status: StatusCode, body: String) -> Self {
        Self::Http {
            endpoint: endpoint.to_string(),
            status,
            detail: extract_detail(&body),
            body,
        }
    }

    /// Only failures where no response came back are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::NoResponse,
            Self::Http { status, .. } if *status == StatusCode::NOT_FOUND => FailureKind::NotFound,
            Self::Http { status, .. } if status.is_server_error() => FailureKind::ServerFault,
            Self::Http { .. } | Self::Decode { .. } | Self::Build(_) | Self::Config { .. } => {
                FailureKind::Rejected
            }
        }
    }
}

/// Pulls a readable message out of a FastAPI-style error body.
///
/// `{"detail": "..."}` yields the string; validation errors
/// (`{"detail": [{"msg": ...}, ...]}`) yield their messages joined.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
