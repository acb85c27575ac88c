use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::base::{Agent, AgentResult};
use super::config::{BaseMessage, SpellerAgentConfig};

/// Spells the caller's words back, one character at a time.
pub struct SpellerAgent {
    config: SpellerAgentConfig,
}

impl SpellerAgent {
    pub fn new(config: SpellerAgentConfig) -> Self {
        Self { config }
    }
}

/// Every character followed by a space.
pub fn spell(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len() * 2), |mut acc, c| {
        acc.push(c);
        acc.push(' ');
        acc
    })
}

#[async_trait]
impl Agent for SpellerAgent {
    fn initial_message(&self) -> Option<&BaseMessage> {
        self.config.initial_message.as_ref()
    }

    async fn respond(
        &mut self,
        human_input: &str,
        segments: mpsc::Sender<String>,
    ) -> AgentResult<()> {
        let reply = spell(human_input);
        if !reply.is_empty() {
            if segments.send(reply).await.is_err() {
                debug!("Reply receiver dropped before the spelling was delivered");
            }
        }
        Ok(())
    }

    fn agent_type(&self) -> &'static str {
        "speller"
    }
}
