//! Call profiles: which bots answer which webhooks, and who dials out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::telephony::{InboundCallProfile, OutboundCallProfile};

/// Profiles shipped with the binary.
pub const DEFAULT_PROFILES_YAML: &str = include_str!("../../profiles.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallProfiles {
    #[serde(default)]
    pub inbound: Vec<InboundCallProfile>,
    pub outbound: OutboundCallProfile,
}

impl CallProfiles {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(format!("call profiles: {e}")))
    }

    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_yaml_str(DEFAULT_PROFILES_YAML)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::AgentConfig;

    #[test]
    fn test_embedded_profiles() {
        let profiles = CallProfiles::embedded().unwrap();

        assert_eq!(profiles.inbound.len(), 1);
        let inbound = &profiles.inbound[0];
        assert_eq!(inbound.url, "/inbound_call");
        assert_eq!(inbound.synthesizer_config.voice(), "es-CO-GonzaloNeural");
        assert_eq!(inbound.transcriber_config.language(), "es");
        assert!(inbound.validate().is_ok());

        assert_eq!(profiles.outbound.from_phone, "+15202239830");
        assert_eq!(profiles.outbound.synthesizer_config.voice(), "es-CO-SalomeNeural");
        let AgentConfig::ChatGpt(ref agent) = profiles.outbound.agent_config else {
            panic!("expected chat_gpt agent");
        };
        assert!(agent.generate_responses);
        assert_eq!(
            agent.prompt_preamble,
            "Actua como un psicoanalista, y ten una consulta conmigo"
        );
    }

    #[test]
    fn test_chunk_size_from_profile() {
        let profiles = CallProfiles::embedded().unwrap();
        let crate::core::stt::TranscriberConfig::Deepgram(ref dg) =
            profiles.inbound[0].transcriber_config;
        assert_eq!(dg.chunk_size, 1000);
    }

    #[test]
    fn test_missing_outbound_is_an_error() {
        assert!(matches!(
            CallProfiles::from_yaml_str("inbound: []\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
