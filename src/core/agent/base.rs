use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::config::BaseMessage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    #[error("Invalid agent configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Agent type not supported by this factory: {0}")]
    UnsupportedAgent(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("LLM provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::NetworkError(e.to_string())
    }
}

/// Decides what the bot says next.
///
/// Replies are pushed to `segments` one speakable piece at a time, so a
/// streaming agent can start talking before the whole reply exists.
#[async_trait]
pub trait Agent: Send {
    /// What the bot says when the call connects.
    fn initial_message(&self) -> Option<&BaseMessage>;

    async fn respond(
        &mut self,
        human_input: &str,
        segments: mpsc::Sender<String>,
    ) -> AgentResult<()>;

    fn agent_type(&self) -> &'static str;
}
