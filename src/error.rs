//! Error types for the gateway.
//!
//! Every request-level failure carries enough information to render the
//! caller-facing `{ "error": { "message", "type" } }` body and HTTP status.

use thiserror::Error;

use crate::translate::openai_types::ErrorResponse;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("No API key found. Provide it via 'Authorization: Bearer <key>'.")]
    Auth,

    #[error("Invalid JSON body: {message}")]
    MalformedRequest { message: String },

    #[error("Error calling DeepSeek API: {message}")]
    UpstreamTransport { message: String },

    #[error("Failed to parse JSON from DeepSeek: {message}")]
    UpstreamProtocol { message: String },

    #[error("DeepSeek returned an error (HTTP {status})")]
    UpstreamReported {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GatewayError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: msg.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::UpstreamTransport {
            message: msg.into(),
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::UpstreamProtocol {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// HTTP status the caller sees for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Auth => 401,
            Self::MalformedRequest { .. } => 400,
            Self::UpstreamTransport { .. } | Self::UpstreamProtocol { .. } => 502,
            Self::UpstreamReported { status, .. } => *status,
            Self::Config { .. } | Self::Io(_) | Self::Json(_) | Self::Toml(_) => 500,
        }
    }

    /// Caller-facing JSON body. Upstream-reported errors are relayed verbatim.
    pub fn to_body(&self) -> serde_json::Value {
        if let Self::UpstreamReported { body, .. } = self {
            return body.clone();
        }

        let err = match self {
            Self::Auth | Self::MalformedRequest { .. } => {
                ErrorResponse::invalid_request(self.to_string())
            }
            _ => ErrorResponse::api_error(self.to_string()),
        };
        serde_json::to_value(err).unwrap_or(serde_json::Value::Null)
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
