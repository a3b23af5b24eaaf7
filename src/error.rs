//! Error taxonomy shared by the token, transport and recording modules.

use std::fmt;
use thiserror::Error;

/// Identity field compared when stopping a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchField {
    ResourceId,
    ChannelName,
    Uid,
}

impl MismatchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceId => "resourceId",
            Self::ChannelName => "channelName",
            Self::Uid => "uid",
        }
    }
}

impl fmt::Display for MismatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A credential or secret required by the operation is not configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The control plane rejected the request or returned something unusable.
    /// `status` is `None` when the request never produced an HTTP response.
    #[error("upstream error{}: {message}", format_status(.status, .code))]
    Upstream {
        status: Option<u16>,
        code: Option<i64>,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{field} mismatch: expected {expected}, got {actual}")]
    Mismatch {
        field: MismatchField,
        expected: String,
        actual: String,
    },
}

impl GatewayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn upstream(status: Option<u16>, code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            code,
            message: message.into(),
        }
    }
}

fn format_status(status: &Option<u16>, code: &Option<i64>) -> String {
    match (*status, *code) {
        (Some(status), Some(code)) => format!(" (status {}, code {})", status, code),
        (Some(status), None) => format!(" (status {})", status),
        (None, Some(code)) => format!(" (code {})", code),
        (None, None) => String::new(),
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
