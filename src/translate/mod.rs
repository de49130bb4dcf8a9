//! Translation between the OpenAI-style caller API and the DeepSeek API.
//!
//! Request mapping, buffered response reshaping and SSE reframing. All
//! translation functions are pure (no I/O).

pub mod deepseek_types;
pub mod openai_types;
pub mod request;
pub mod response;
pub mod streaming;
