//! Buffered relay: reshape a DeepSeek JSON body into an OpenAI chat completion.

use super::deepseek_types::{UpstreamChoice, UpstreamResponse};
use super::openai_types::{
    ChatCompletion, Choice, ChoiceMessage, CompletionTokensDetails, PromptTokensDetails, Usage,
};
use crate::error::{GatewayError, Result};
use crate::models::{content_field, ContentField};

/// Content used when a message carries no text in any known field.
pub const MISSING_CONTENT: &str = "DUMMY";

/// Status reported when the upstream answers 2xx but embeds an error.
const EMBEDDED_ERROR_STATUS: u16 = 400;

/// Outcome of a successful buffered relay.
#[derive(Debug, Clone)]
pub enum BufferedReply {
    Translated(ChatCompletion),
    /// Upstream body returned untouched (raw-response mode).
    Raw(serde_json::Value),
}

impl BufferedReply {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            BufferedReply::Translated(completion) => {
                serde_json::to_value(completion).unwrap_or(serde_json::Value::Null)
            }
            BufferedReply::Raw(value) => value.clone(),
        }
    }
}

/// Relay a fully-read upstream response.
///
/// `caller_model` is echoed in the result; `upstream_model` selects the
/// content field.
pub fn relay_buffered(
    status: u16,
    body: &[u8],
    caller_model: &str,
    upstream_model: &str,
    raw_response: bool,
) -> Result<BufferedReply> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| GatewayError::protocol(e.to_string()))?;

    let success = (200..300).contains(&status);
    let embedded_error = value.get("error").is_some_and(|e| !e.is_null());

    if !success || embedded_error {
        return Err(GatewayError::UpstreamReported {
            status: if success { EMBEDDED_ERROR_STATUS } else { status },
            body: value,
        });
    }

    if raw_response {
        return Ok(BufferedReply::Raw(value));
    }

    let resp: UpstreamResponse =
        serde_json::from_value(value).map_err(|e| GatewayError::protocol(e.to_string()))?;

    Ok(BufferedReply::Translated(deepseek_to_openai(
        &resp,
        caller_model,
        upstream_model,
    )))
}

/// Reshape a parsed DeepSeek response. Pure apart from the generated id and
/// timestamp.
pub fn deepseek_to_openai(
    resp: &UpstreamResponse,
    caller_model: &str,
    upstream_model: &str,
) -> ChatCompletion {
    let field = content_field(upstream_model);
    let now = chrono::Utc::now();

    let usage = resp.usage.clone().unwrap_or_default();

    ChatCompletion {
        id: completion_id(),
        object: "chat.completion".to_string(),
        created: now.timestamp(),
        model: caller_model.to_string(),
        choices: resp.choices.iter().map(|c| reshape_choice(c, field)).collect(),
        usage: Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            prompt_tokens_details: PromptTokensDetails::default(),
            completion_tokens_details: CompletionTokensDetails::default(),
        },
        service_tier: "default".to_string(),
        system_fingerprint: format!("fp_{}", uuid::Uuid::new_v4()),
    }
}

fn reshape_choice(choice: &UpstreamChoice, field: ContentField) -> Choice {
    let message = &choice.message;
    let content = field
        .read(message)
        .or(message.content.as_deref())
        .unwrap_or(MISSING_CONTENT);

    Choice {
        index: choice.index,
        message: ChoiceMessage {
            role: message.role.clone(),
            content: content.to_string(),
            reasoning_content: message.reasoning_content.clone(),
            refusal: None,
        },
        logprobs: None,
        finish_reason: choice.finish_reason.clone(),
    }
}

/// Time-ordered, process-unique completion id: `gen-<unix millis>-<uuid>`.
pub fn completion_id() -> String {
    format!(
        "gen-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4()
    )
}
