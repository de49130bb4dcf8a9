//! Translate an inbound OpenAI-style request into a DeepSeek request.
//!
//! Checks for a bearer credential, parses the body, applies the model
//! mapping and fills in defaults. No I/O happens here.

use super::deepseek_types::UpstreamRequest;
use super::openai_types::IncomingRequest;
use crate::error::{GatewayError, Result};
use crate::models::ModelMapping;

const BEARER: &str = "Bearer ";

/// Everything needed to make the upstream call and shape its reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedRequest {
    /// Value for the upstream `Authorization` header.
    pub authorization: String,
    /// Model the caller asked for (after defaulting), echoed back in responses.
    pub caller_model: String,
    pub upstream: UpstreamRequest,
}

impl TranslatedRequest {
    pub fn upstream_model(&self) -> &str {
        &self.upstream.model
    }

    pub fn is_streaming(&self) -> bool {
        self.upstream.stream
    }
}

/// Pull the credential out of an `Authorization` header value and return
/// the header value to forward upstream. Only the `Bearer` scheme is
/// accepted (matched case-insensitively); anything else is a missing key.
pub fn forward_credential(authorization: Option<&str>) -> Result<String> {
    let raw = authorization.ok_or(GatewayError::Auth)?.trim_start();
    let token = match raw.get(..BEARER.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => raw[BEARER.len()..].trim(),
        _ => return Err(GatewayError::Auth),
    };

    if token.is_empty() {
        return Err(GatewayError::Auth);
    }

    if token.starts_with(BEARER) {
        Ok(token.to_string())
    } else {
        Ok(format!("{BEARER}{token}"))
    }
}

/// Translate an inbound request. The credential is checked before the body
/// is looked at, so a missing key is reported even for a broken body.
pub fn translate_request(
    authorization: Option<&str>,
    body: &[u8],
    mapping: &ModelMapping,
    default_model: &str,
) -> Result<TranslatedRequest> {
    let authorization = forward_credential(authorization)?;

    let incoming: IncomingRequest =
        serde_json::from_slice(body).map_err(|e| GatewayError::malformed(e.to_string()))?;

    let caller_model = incoming
        .model
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default_model.to_string());
    let upstream_model = mapping.to_upstream(&caller_model).to_string();

    Ok(TranslatedRequest {
        authorization,
        upstream: UpstreamRequest {
            model: upstream_model,
            messages: incoming.messages.unwrap_or_default(),
            stream: incoming.stream.unwrap_or(false),
        },
        caller_model,
    })
}
