use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::agent::{AgentFactory, SpellerAgentFactory};
use crate::core::providers::{DefaultProviderFactory, ProviderFactory};
use crate::telephony::{ConfigManager, InMemoryConfigManager, TelephonyResult, TelephonyServer};

/// Everything the handlers share, built once at startup.
pub struct AppState {
    pub config: ServerConfig,
    /// Resolved public host, without scheme
    pub base_url: String,
    pub config_manager: Arc<dyn ConfigManager>,
    pub agent_factory: Arc<dyn AgentFactory>,
    pub provider_factory: Arc<dyn ProviderFactory>,
}

impl AppState {
    /// State with in-memory call storage and the default factories.
    pub fn new(config: ServerConfig, base_url: impl Into<String>) -> Arc<Self> {
        Self::with_config_manager(config, base_url, Arc::new(InMemoryConfigManager::new()))
    }

    /// State storing call configs in `config_manager`.
    pub fn with_config_manager(
        config: ServerConfig,
        base_url: impl Into<String>,
        config_manager: Arc<dyn ConfigManager>,
    ) -> Arc<Self> {
        let mut agent_factory = SpellerAgentFactory::new(config.openai_api_key.clone());
        if let Some(ref endpoint) = config.endpoints.openai_url {
            agent_factory = agent_factory.with_openai_endpoint(endpoint.clone());
        }
        let provider_factory = DefaultProviderFactory::from_server_config(&config);

        Arc::new(Self {
            base_url: base_url.into(),
            config_manager,
            agent_factory: Arc::new(agent_factory),
            provider_factory: Arc::new(provider_factory),
            config,
        })
    }

    /// Telephony server for the configured inbound profiles.
    pub fn telephony_server(&self) -> TelephonyResult<TelephonyServer> {
        TelephonyServer::new(
            self.base_url.clone(),
            self.config_manager.clone(),
            self.config.profiles.inbound.clone(),
            self.agent_factory.clone(),
            self.provider_factory.clone(),
            self.config.twilio_config(),
        )
    }
}
