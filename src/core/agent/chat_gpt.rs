//! OpenAI chat completions agent.
//!
//! The system prompt is the configured `prompt_preamble`; the whole call
//! transcript is replayed on every turn. With `generate_responses` the
//! completion is streamed (SSE) and each finished sentence is handed to the
//! conversation as soon as it is complete.

use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::base::{Agent, AgentError, AgentResult};
use super::config::{BaseMessage, ChatGptAgentConfig};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Splits streamed text into sentences.
#[derive(Debug, Default)]
pub struct SentenceSplitter {
    pending: String,
}

impl SentenceSplitter {
    /// Add a token and return every sentence it completed.
    pub fn push(&mut self, token: &str) -> Vec<String> {
        self.pending.push_str(token);
        let mut sentences = Vec::new();

        loop {
            let boundary = self
                .pending
                .char_indices()
                .zip(self.pending.chars().skip(1))
                .find(|((_, c), next)| matches!(c, '.' | '!' | '?') && next.is_whitespace())
                .map(|((i, c), _)| i + c.len_utf8());

            let Some(end) = boundary else {
                break;
            };
            let sentence = self.pending[..end].trim().to_string();
            self.pending = self.pending[end..].trim_start().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
        }
        sentences
    }

    /// Whatever is left once the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Parse one SSE `data:` line. `Ok(None)` means the line carried no text.
fn parse_sse_line(line: &str) -> AgentResult<Option<SseEvent>> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| AgentError::MalformedResponse(format!("bad stream chunk: {e}")))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .map(SseEvent::Token))
}

/// Splits a byte stream into complete lines.
///
/// Bytes are kept raw until a newline arrives so a multi-byte character cut
/// across network chunks is decoded whole.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: BytesMut,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator, if one is buffered.
    fn next_line(&mut self) -> AgentResult<Option<String>> {
        let Some(newline) = self.pending.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let line = self.pending.split_to(newline + 1);
        let line = String::from_utf8(line[..newline].to_vec())
            .map_err(|e| AgentError::MalformedResponse(format!("stream is not UTF-8: {e}")))?;
        Ok(Some(line))
    }
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Token(String),
    Done,
}

pub struct ChatGptAgent {
    client: reqwest::Client,
    config: ChatGptAgentConfig,
    api_key: String,
    endpoint: String,
    transcript: Vec<ChatMessage>,
}

impl ChatGptAgent {
    pub fn new(config: ChatGptAgentConfig, api_key: impl Into<String>) -> AgentResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::InvalidConfiguration(
                "OpenAI API key not configured in server environment".into(),
            ));
        }

        let mut transcript = vec![ChatMessage::new(Role::System, &config.prompt_preamble)];
        if let Some(ref initial) = config.initial_message {
            transcript.push(ChatMessage::new(Role::Assistant, &initial.text));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            config,
            api_key,
            endpoint: OPENAI_CHAT_URL.to_string(),
            transcript,
        })
    }

    /// Use another OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    fn request_body(&self, stream: bool) -> serde_json::Value {
        json!({
            "model": self.config.model_name,
            "messages": self.transcript,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": stream,
        })
    }

    async fn send(&self, stream: bool) -> AgentResult<reqwest::Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(stream))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::ProviderError { status, message });
        }
        Ok(response)
    }

    async fn complete(&self, segments: &mpsc::Sender<String>) -> AgentResult<String> {
        let body: CompletionResponse = self
            .send(false)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;
        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| AgentError::MalformedResponse("no choices returned".into()))?;

        if !text.is_empty() && segments.send(text.clone()).await.is_err() {
            debug!("Reply receiver dropped before the reply was delivered");
        }
        Ok(text)
    }

    async fn stream(&self, segments: &mpsc::Sender<String>) -> AgentResult<String> {
        let mut body = self.send(true).await?.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut splitter = SentenceSplitter::default();
        let mut full_reply = String::new();

        'outer: while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            lines.push(&chunk);

            while let Some(line) = lines.next_line()? {
                match parse_sse_line(line.trim())? {
                    Some(SseEvent::Token(token)) => {
                        full_reply.push_str(&token);
                        for sentence in splitter.push(&token) {
                            if segments.send(sentence).await.is_err() {
                                debug!("Reply receiver dropped, stopping stream");
                                break 'outer;
                            }
                        }
                    }
                    Some(SseEvent::Done) => break 'outer,
                    None => {}
                }
            }
        }

        if let Some(rest) = splitter.finish() {
            if segments.send(rest).await.is_err() {
                debug!("Reply receiver dropped before the last sentence");
            }
        }
        Ok(full_reply.trim().to_string())
    }
}

#[async_trait]
impl Agent for ChatGptAgent {
    fn initial_message(&self) -> Option<&BaseMessage> {
        self.config.initial_message.as_ref()
    }

    async fn respond(
        &mut self,
        human_input: &str,
        segments: mpsc::Sender<String>,
    ) -> AgentResult<()> {
        self.transcript
            .push(ChatMessage::new(Role::User, human_input));

        let reply = if self.config.generate_responses {
            self.stream(&segments).await
        } else {
            self.complete(&segments).await
        };

        match reply {
            Ok(text) if !text.is_empty() => {
                self.transcript.push(ChatMessage::new(Role::Assistant, text));
                Ok(())
            }
            Ok(_) => {
                warn!("LLM returned an empty reply");
                Ok(())
            }
            Err(e) => {
                self.transcript.pop();
                Err(e)
            }
        }
    }

    fn agent_type(&self) -> &'static str {
        "chat_gpt"
    }
}
