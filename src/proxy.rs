//! Hosting-independent gateway core.
//!
//! [`Gateway::handle`] takes an [`InboundRequest`] and produces a
//! [`GatewayReply`]: either a JSON body with a status, or a stream of SSE
//! frames. HTTP servers only need to adapt their request/response types.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::logging::{LogLevel, SharedLogger};
use crate::models::ModelMapping;
use crate::translate::openai_types::ErrorResponse;
use crate::translate::request::{translate_request, TranslatedRequest};
use crate::translate::response::{relay_buffered, BufferedReply};
use crate::translate::streaming::SseReframer;

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Stream of ready-to-write SSE frames. Never fails mid-stream.
pub type SseStream = Pin<Box<dyn Stream<Item = std::result::Result<Bytes, Infallible>> + Send>>;

/// What the core needs from an inbound HTTP request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(authorization: Option<impl Into<String>>, body: impl Into<Bytes>) -> Self {
        Self {
            authorization: authorization.map(Into::into),
            body: body.into(),
        }
    }
}

/// What the core hands back to the HTTP server.
pub enum GatewayReply {
    Json { status: u16, body: serde_json::Value },
    Stream(SseStream),
}

impl GatewayReply {
    fn from_error(err: &GatewayError) -> Self {
        GatewayReply::Json {
            status: err.status(),
            body: err.to_body(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            GatewayReply::Json { status, .. } => *status,
            GatewayReply::Stream(_) => 200,
        }
    }
}

impl std::fmt::Debug for GatewayReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayReply::Json { status, body } => f
                .debug_struct("Json")
                .field("status", status)
                .field("body", body)
                .finish(),
            GatewayReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

struct Inner {
    config: GatewayConfig,
    mapping: ModelMapping,
    completions_url: String,
    client: reqwest::Client,
    logger: SharedLogger,
}

/// Shared, immutable gateway state. Cloning is cheap.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

impl Gateway {
    /// Build a gateway with its own HTTP client. `timeout_secs` bounds the
    /// silence between reads, not the whole response, so long streams that
    /// keep producing chunks are never cut off.
    pub fn new(config: GatewayConfig, logger: SharedLogger) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(Duration::from_secs(config.upstream.timeout_secs))
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client, logger))
    }

    pub fn with_client(config: GatewayConfig, client: reqwest::Client, logger: SharedLogger) -> Self {
        let mapping = config.model_mapping();
        let completions_url = config.completions_url();
        Self {
            inner: Arc::new(Inner {
                config,
                mapping,
                completions_url,
                client,
                logger,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.inner.logger
    }

    /// Handle one chat-completions request end to end. Errors become JSON
    /// replies with the matching status.
    pub async fn handle(&self, req: InboundRequest) -> GatewayReply {
        match self.try_handle(req).await {
            Ok(reply) => reply,
            Err(err) => {
                let level = if err.status() >= 500 {
                    LogLevel::Error
                } else {
                    LogLevel::Warn
                };
                self.inner.logger.log_with_context(
                    level,
                    "gateway",
                    err.to_string(),
                    serde_json::json!({ "status": err.status() }),
                );
                GatewayReply::from_error(&err)
            }
        }
    }

    async fn try_handle(&self, req: InboundRequest) -> Result<GatewayReply> {
        let translated = translate_request(
            req.authorization.as_deref(),
            &req.body,
            &self.inner.mapping,
            &self.inner.config.default_model,
        )?;

        self.inner.logger.info(
            "gateway",
            format!(
                "Request: model={} upstream_model={} streaming={} messages={}",
                translated.caller_model,
                translated.upstream_model(),
                translated.is_streaming(),
                translated.upstream.messages.len()
            ),
        );

        if translated.is_streaming() {
            let stream = self.proxy_streaming(&translated).await?;
            Ok(GatewayReply::Stream(stream))
        } else {
            let reply = self.proxy_buffered(&translated).await?;
            Ok(GatewayReply::Json {
                status: 200,
                body: reply.to_json(),
            })
        }
    }

    async fn send_upstream(&self, req: &TranslatedRequest) -> Result<reqwest::Response> {
        self.inner.logger.debug(
            "proxy",
            format!(
                "POST {} model={} stream={}",
                self.inner.completions_url,
                req.upstream_model(),
                req.is_streaming()
            ),
        );

        self.inner
            .client
            .post(&self.inner.completions_url)
            .header(reqwest::header::AUTHORIZATION, &req.authorization)
            .json(&req.upstream)
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))
    }

    /// Forward a non-streaming request and reshape the reply.
    pub async fn proxy_buffered(&self, req: &TranslatedRequest) -> Result<BufferedReply> {
        let response = self.send_upstream(req).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport(format!("Failed to read response body: {e}")))?;

        self.inner.logger.debug(
            "proxy",
            format!("Response status={} body_len={}", status, body.len()),
        );

        let reply = relay_buffered(
            status,
            &body,
            &req.caller_model,
            req.upstream_model(),
            self.inner.config.raw_response,
        )?;

        if let BufferedReply::Translated(ref completion) = reply {
            self.inner.logger.info(
                "proxy",
                format!(
                    "Completed: choices={} prompt={} completion={} tokens",
                    completion.choices.len(),
                    completion.usage.prompt_tokens,
                    completion.usage.completion_tokens
                ),
            );
        }

        Ok(reply)
    }

    /// Forward a streaming request. Upstream failures reported before the
    /// first byte are returned as errors; after that the stream always ends
    /// with `data: [DONE]`.
    pub async fn proxy_streaming(&self, req: &TranslatedRequest) -> Result<SseStream> {
        let response = self.send_upstream(req).await?;
        let status = response.status();

        if !status.is_success() {
            let status = status.as_u16();
            let body = response.bytes().await.unwrap_or_default();
            let body = serde_json::from_slice::<serde_json::Value>(&body).unwrap_or_else(|_| {
                serde_json::to_value(ErrorResponse::api_error(format!(
                    "DeepSeek streaming error (HTTP {status})"
                )))
                .unwrap_or(serde_json::Value::Null)
            });
            return Err(GatewayError::UpstreamReported { status, body });
        }

        Ok(Box::pin(relay_stream(
            response.bytes_stream(),
            self.inner.logger.clone(),
        )))
    }
}

/// Re-frame an upstream byte stream into SSE frames. Read errors end the
/// stream early; the terminal frame is still sent.
pub fn relay_stream<S, E>(
    byte_stream: S,
    logger: SharedLogger,
) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut reframer = SseReframer::new();
        let mut frames_sent = 0usize;

        tokio::pin!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    logger.error("stream", format!("Stream error from DeepSeek: {}", e));
                    break;
                }
            };

            for frame in reframer.push(&chunk) {
                frames_sent += 1;
                yield Ok(Bytes::from(frame));
            }
        }

        if reframer.pending() > 0 {
            logger.debug("stream", format!("Flushing {} unterminated bytes", reframer.pending()));
        }

        for frame in reframer.finish() {
            frames_sent += 1;
            yield Ok(Bytes::from(frame));
        }

        logger.info("stream", format!("Stream completed: frames={}", frames_sent));
    }
}
