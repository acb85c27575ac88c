use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use super::profiles::CallProfiles;

/// Complete YAML configuration structure
///
/// Every field is optional; values present here override the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   base_url: "bot.example.com"
///
/// tunnel:
///   ngrok_auth_token: "your-ngrok-token"
///   ngrok_bin: "/usr/local/bin/ngrok"
///
/// providers:
///   deepgram_api_key: "your-deepgram-key"
///   azure_speech_key: "your-azure-key"
///   azure_speech_region: "eastus"
///   elevenlabs_api_key: "your-elevenlabs-key"
///   openai_api_key: "your-openai-key"
///
/// twilio:
///   account_sid: "ACxxxxxxxx"
///   auth_token: "your-auth-token"
///   outbound_caller_number: "+15202239830"
///
/// security:
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
///
/// profiles:
///   inbound: [...]
///   outbound: {...}
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub tunnel: Option<TunnelYaml>,
    pub providers: Option<ProvidersYaml>,
    pub twilio: Option<TwilioYaml>,
    pub security: Option<SecurityYaml>,
    pub endpoints: Option<EndpointsYaml>,
    pub profiles: Option<CallProfiles>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TunnelYaml {
    pub ngrok_auth_token: Option<String>,
    pub ngrok_bin: Option<String>,
    pub ngrok_api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub deepgram_api_key: Option<String>,
    pub azure_speech_key: Option<String>,
    pub azure_speech_region: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TwilioYaml {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub outbound_caller_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

/// Provider endpoint overrides, for proxies and local fakes.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EndpointsYaml {
    pub deepgram_url: Option<String>,
    pub azure_tts_url: Option<String>,
    pub elevenlabs_url: Option<String>,
    pub openai_url: Option<String>,
    pub twilio_api_url: Option<String>,
}

impl YamlConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
