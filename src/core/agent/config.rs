use serde::{Deserialize, Serialize};

use super::base::{AgentError, AgentResult};

pub const DEFAULT_CHAT_GPT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// A piece of text the bot says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseMessage {
    pub text: String,
}

impl BaseMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

fn default_model_name() -> String {
    DEFAULT_CHAT_GPT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// OpenAI chat agent driven by a free-text system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatGptAgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<BaseMessage>,
    pub prompt_preamble: String,
    /// Stream the completion and speak it sentence by sentence.
    #[serde(default)]
    pub generate_responses: bool,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ChatGptAgentConfig {
    pub fn new(initial_message: Option<&str>, prompt_preamble: impl Into<String>) -> Self {
        Self {
            initial_message: initial_message.map(BaseMessage::new),
            prompt_preamble: prompt_preamble.into(),
            generate_responses: false,
            model_name: default_model_name(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Echo agent that spells back whatever the caller said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpellerAgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<BaseMessage>,
}

/// Agent selection for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentConfig {
    ChatGpt(ChatGptAgentConfig),
    Speller(SpellerAgentConfig),
}

impl AgentConfig {
    pub fn agent_type(&self) -> &'static str {
        match self {
            Self::ChatGpt(_) => "chat_gpt",
            Self::Speller(_) => "speller",
        }
    }

    pub fn initial_message(&self) -> Option<&BaseMessage> {
        match self {
            Self::ChatGpt(c) => c.initial_message.as_ref(),
            Self::Speller(c) => c.initial_message.as_ref(),
        }
    }

    pub fn validate(&self) -> AgentResult<()> {
        match self {
            Self::ChatGpt(c) => {
                if c.prompt_preamble.trim().is_empty() {
                    return Err(AgentError::InvalidConfiguration(
                        "prompt_preamble must not be empty".into(),
                    ));
                }
                if c.model_name.trim().is_empty() {
                    return Err(AgentError::InvalidConfiguration(
                        "model_name must not be empty".into(),
                    ));
                }
                if !(0.0..=2.0).contains(&c.temperature) {
                    return Err(AgentError::InvalidConfiguration(format!(
                        "temperature {} is outside 0.0..=2.0",
                        c.temperature
                    )));
                }
                Ok(())
            }
            Self::Speller(_) => Ok(()),
        }
    }
}

impl From<ChatGptAgentConfig> for AgentConfig {
    fn from(config: ChatGptAgentConfig) -> Self {
        Self::ChatGpt(config)
    }
}

impl From<SpellerAgentConfig> for AgentConfig {
    fn from(config: SpellerAgentConfig) -> Self {
        Self::Speller(config)
    }
}
