//! Dialogue agents.

pub mod base;
pub mod chat_gpt;
pub mod config;
pub mod factory;
pub mod speller;

pub use base::{Agent, AgentError, AgentResult};
pub use chat_gpt::{ChatGptAgent, SentenceSplitter};
pub use config::{AgentConfig, BaseMessage, ChatGptAgentConfig, SpellerAgentConfig};
pub use factory::{AgentFactory, SpellerAgentFactory};
pub use speller::SpellerAgent;
