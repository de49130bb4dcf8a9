//! Model naming: caller aliases, upstream models and their content fields.
//!
//! Callers speak OpenAI model names (`gpt-4`, `gpt-3.5-turbo`); DeepSeek
//! knows `deepseek-chat` and `deepseek-reasoner`. The reasoner places its
//! generated text in `reasoning_content`, so the field to read from an
//! upstream message depends on which model produced it.

use std::collections::HashMap;

use crate::translate::deepseek_types::UpstreamMessage;
use crate::translate::openai_types::{ModelCard, ModelList};

/// Name of the message field holding generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentField {
    Content,
    ReasoningContent,
}

impl ContentField {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentField::Content => "content",
            ContentField::ReasoningContent => "reasoning_content",
        }
    }

    /// Read this field from an upstream message.
    pub fn read(self, message: &UpstreamMessage) -> Option<&str> {
        match self {
            ContentField::Content => message.content.as_deref(),
            ContentField::ReasoningContent => message.reasoning_content.as_deref(),
        }
    }
}

/// Upstream models the gateway knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamModel {
    DeepseekChat,
    DeepseekReasoner,
}

const UPSTREAM_MODELS: &[UpstreamModel] = &[
    UpstreamModel::DeepseekChat,
    UpstreamModel::DeepseekReasoner,
];

impl UpstreamModel {
    pub fn id(self) -> &'static str {
        match self {
            UpstreamModel::DeepseekChat => "deepseek-chat",
            UpstreamModel::DeepseekReasoner => "deepseek-reasoner",
        }
    }

    pub fn content_field(self) -> ContentField {
        match self {
            UpstreamModel::DeepseekChat => ContentField::Content,
            UpstreamModel::DeepseekReasoner => ContentField::ReasoningContent,
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        UPSTREAM_MODELS.iter().copied().find(|m| m.id() == id)
    }

    #[must_use]
    pub fn all() -> &'static [UpstreamModel] {
        UPSTREAM_MODELS
    }
}

/// Content field for an upstream model id; unknown models use `content`.
pub fn content_field(upstream_model: &str) -> ContentField {
    UpstreamModel::from_id(upstream_model)
        .map(UpstreamModel::content_field)
        .unwrap_or(ContentField::Content)
}

/// Built-in caller aliases.
const BUILTIN_ALIASES: &[(&str, UpstreamModel)] = &[
    ("gpt-3.5-turbo", UpstreamModel::DeepseekChat),
    ("gpt-4", UpstreamModel::DeepseekReasoner),
];

/// Caller-facing → upstream model mapping. Immutable once built and shared
/// by every request.
#[derive(Debug, Clone)]
pub struct ModelMapping {
    aliases: HashMap<String, String>,
}

impl ModelMapping {
    /// Built-in aliases extended (and overridden) by `extra`.
    pub fn new(extra: &HashMap<String, String>) -> Self {
        let mut aliases: HashMap<String, String> = BUILTIN_ALIASES
            .iter()
            .map(|(alias, model)| ((*alias).to_string(), model.id().to_string()))
            .collect();
        aliases.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { aliases }
    }

    /// Map a caller model to the upstream model. Unmapped ids pass through.
    pub fn to_upstream<'a>(&'a self, caller_model: &'a str) -> &'a str {
        self.aliases
            .get(caller_model)
            .map(String::as_str)
            .unwrap_or(caller_model)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for ModelMapping {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}

/// Static catalog served from `/v1/models`.
pub fn model_catalog() -> ModelList {
    let created = chrono::Utc::now().timestamp_millis();
    ModelList {
        object: "list".to_string(),
        data: UpstreamModel::all()
            .iter()
            .map(|m| ModelCard {
                id: m.id().to_string(),
                object: "model".to_string(),
                created,
                owned_by: "deepseek".to_string(),
            })
            .collect(),
    }
}
