//! Upstream types, shaped like the DeepSeek chat-completions API.
//!
//! Only the fields the gateway reads are modelled; everything else in a
//! response message is kept in `extra` and ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Request types (what we send TO DeepSeek)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    pub model: String,
    pub messages: Vec<serde_json::Value>,
    pub stream: bool,
}

// ---------------------------------------------------------------------------
// Response types (what we receive FROM DeepSeek)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<UpstreamChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UpstreamUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamChoice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: UpstreamMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamMessage {
    #[serde(default = "default_role", deserialize_with = "role_or_default")]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Chain-of-thought text produced by `deepseek-reasoner`.
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for UpstreamMessage {
    fn default() -> Self {
        Self {
            role: default_role(),
            content: None,
            reasoning_content: None,
            extra: HashMap::new(),
        }
    }
}

fn default_role() -> String {
    "assistant".to_string()
}

/// DeepSeek sometimes sends `null` where a value is absent; treat both alike.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn role_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_role))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completion_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tokens: u64,
}
