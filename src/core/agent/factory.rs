use super::base::{Agent, AgentError, AgentResult};
use super::chat_gpt::ChatGptAgent;
use super::config::AgentConfig;
use super::speller::SpellerAgent;

/// Builds the dialogue agent for one call.
pub trait AgentFactory: Send + Sync {
    fn create_agent(&self, config: &AgentConfig) -> AgentResult<Box<dyn Agent>>;
}

/// Default factory: `chat_gpt` configs get the OpenAI agent, `speller`
/// configs get the speller.
#[derive(Debug, Clone, Default)]
pub struct SpellerAgentFactory {
    openai_api_key: Option<String>,
    openai_endpoint: Option<String>,
}

impl SpellerAgentFactory {
    pub fn new(openai_api_key: Option<String>) -> Self {
        Self {
            openai_api_key,
            openai_endpoint: None,
        }
    }

    pub fn with_openai_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.openai_endpoint = Some(endpoint.into());
        self
    }
}

impl AgentFactory for SpellerAgentFactory {
    fn create_agent(&self, config: &AgentConfig) -> AgentResult<Box<dyn Agent>> {
        config.validate()?;
        match config {
            AgentConfig::ChatGpt(chat) => {
                let key = self.openai_api_key.as_deref().ok_or_else(|| {
                    AgentError::InvalidConfiguration(
                        "OpenAI API key not configured in server environment".into(),
                    )
                })?;
                let mut agent = ChatGptAgent::new(chat.clone(), key)?;
                if let Some(ref endpoint) = self.openai_endpoint {
                    agent = agent.with_endpoint(endpoint.clone());
                }
                Ok(Box::new(agent))
            }
            AgentConfig::Speller(speller) => Ok(Box::new(SpellerAgent::new(speller.clone()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::config::{ChatGptAgentConfig, SpellerAgentConfig};

    #[test]
    fn test_selects_agent_by_type() {
        let factory = SpellerAgentFactory::new(Some("sk".into()));

        let chat: AgentConfig = ChatGptAgentConfig::new(Some("Hola"), "prompt").into();
        assert_eq!(factory.create_agent(&chat).unwrap().agent_type(), "chat_gpt");

        let speller: AgentConfig = SpellerAgentConfig::default().into();
        assert_eq!(factory.create_agent(&speller).unwrap().agent_type(), "speller");
    }

    #[test]
    fn test_chat_gpt_needs_key() {
        let factory = SpellerAgentFactory::default();
        let chat: AgentConfig = ChatGptAgentConfig::new(None, "prompt").into();
        assert!(matches!(
            factory.create_agent(&chat),
            Err(AgentError::InvalidConfiguration(_))
        ));

        let speller: AgentConfig = SpellerAgentConfig::default().into();
        assert!(factory.create_agent(&speller).is_ok());
    }
}
