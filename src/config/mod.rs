//! Configuration module for the call bot gateway
//!
//! Server configuration comes from `.env` files, environment variables and an
//! optional YAML file. Priority: CLI flags > YAML > ENV vars > .env values > defaults.
//! Call profiles ship embedded (`profiles.yaml`) and can be replaced by the
//! `profiles` section of the YAML file.
//!
//! # Example
//! ```rust,no_run
//! use callbot_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use thiserror::Error;

mod env;
pub mod profiles;
mod yaml;

pub use env::{env_parse, env_var};
pub use profiles::{CallProfiles, DEFAULT_PROFILES_YAML};
pub use yaml::YamlConfig;

use crate::telephony::TwilioConfig;
use crate::tunnel::ngrok::{DEFAULT_NGROK_API_URL, DEFAULT_NGROK_BIN};
use crate::utils::phone::validate_phone_number;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_AZURE_SPEECH_REGION: &str = "eastus";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Parse(String),
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
    #[error("{0} not configured in server environment")]
    MissingKey(String),
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("Invalid call profiles: {0}")]
    InvalidProfiles(String),
}

/// Provider endpoints, `None` meaning the public default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    pub deepgram_url: Option<String>,
    pub azure_tts_url: Option<String>,
    pub elevenlabs_url: Option<String>,
    pub openai_url: Option<String>,
    pub twilio_api_url: Option<String>,
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, public base URL, tunnel)
/// - Provider API keys (Deepgram, Azure Speech, ElevenLabs, OpenAI)
/// - Twilio credentials and the outbound caller number
/// - Rate limiting
/// - Call profiles
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Public host Twilio reaches us at, scheme optional
    pub base_url: Option<String>,

    // Tunnel settings, used only without a base URL
    pub ngrok_auth_token: Option<String>,
    pub ngrok_bin: String,
    pub ngrok_api_url: String,

    // Provider API keys
    pub deepgram_api_key: Option<String>,
    /// Azure Speech Services subscription key
    pub azure_speech_key: Option<String>,
    /// Azure region the key belongs to (e.g., "eastus")
    pub azure_speech_region: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    // Twilio
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    /// Caller ID for outbound calls, overrides the outbound profile
    pub outbound_caller_number: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address, 0 disables the limiter
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,

    pub endpoints: EndpointOverrides,
    pub profiles: CallProfiles,
}

/// Zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        for secret in [
            &mut self.ngrok_auth_token,
            &mut self.deepgram_api_key,
            &mut self.azure_speech_key,
            &mut self.elevenlabs_api_key,
            &mut self.openai_api_key,
            &mut self.twilio_auth_token,
        ] {
            if let Some(value) = secret {
                value.zeroize();
            }
        }
    }
}

impl ServerConfig {
    /// Defaults with the given profiles and no credentials.
    pub fn new(profiles: CallProfiles) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            base_url: None,
            ngrok_auth_token: None,
            ngrok_bin: DEFAULT_NGROK_BIN.to_string(),
            ngrok_api_url: DEFAULT_NGROK_API_URL.to_string(),
            deepgram_api_key: None,
            azure_speech_key: None,
            azure_speech_region: None,
            elevenlabs_api_key: None,
            openai_api_key: None,
            twilio_account_sid: None,
            twilio_auth_token: None,
            outbound_caller_number: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            endpoints: EndpointOverrides::default(),
            profiles,
        }
    }

    /// Load configuration from environment variables
    ///
    /// `.env` is expected to have been loaded already (see `main.rs`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(CallProfiles::embedded()?);

        if let Some(host) = env_var("HOST") {
            config.host = host;
        }
        config.base_url = env_var("BASE_URL");

        config.ngrok_auth_token = env_var("NGROK_AUTH_TOKEN");
        if let Some(bin) = env_var("NGROK_BIN") {
            config.ngrok_bin = bin;
        }
        if let Some(url) = env_var("NGROK_API_URL") {
            config.ngrok_api_url = url;
        }

        config.deepgram_api_key = env_var("DEEPGRAM_API_KEY");
        config.azure_speech_key = env_var("AZURE_SPEECH_KEY");
        config.azure_speech_region = env_var("AZURE_SPEECH_REGION");
        config.elevenlabs_api_key = env_var("ELEVEN_LABS_API_KEY");
        config.openai_api_key = env_var("OPENAI_API_KEY");

        config.twilio_account_sid = env_var("TWILIO_ACCOUNT_SID");
        config.twilio_auth_token = env_var("TWILIO_AUTH_TOKEN");
        config.outbound_caller_number = env_var("OUTBOUND_CALLER_NUMBER");

        config.rate_limit_requests_per_second = env_parse("RATE_LIMIT_REQUESTS_PER_SECOND", 60)?;
        config.rate_limit_burst_size = env_parse("RATE_LIMIT_BURST_SIZE", 10)?;

        config.apply_outbound_caller();
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = YamlConfig::from_file(path)?;
        let mut config = Self::load_env()?;
        config.apply_yaml(yaml);
        config.apply_outbound_caller();
        config.validate()?;
        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }
        fn set_opt<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        if let Some(server) = yaml.server {
            set(&mut self.host, server.host);
            set(&mut self.port, server.port);
            set_opt(&mut self.base_url, server.base_url);
        }
        if let Some(tunnel) = yaml.tunnel {
            set_opt(&mut self.ngrok_auth_token, tunnel.ngrok_auth_token);
            set(&mut self.ngrok_bin, tunnel.ngrok_bin);
            set(&mut self.ngrok_api_url, tunnel.ngrok_api_url);
        }
        if let Some(providers) = yaml.providers {
            set_opt(&mut self.deepgram_api_key, providers.deepgram_api_key);
            set_opt(&mut self.azure_speech_key, providers.azure_speech_key);
            set_opt(&mut self.azure_speech_region, providers.azure_speech_region);
            set_opt(&mut self.elevenlabs_api_key, providers.elevenlabs_api_key);
            set_opt(&mut self.openai_api_key, providers.openai_api_key);
        }
        if let Some(twilio) = yaml.twilio {
            set_opt(&mut self.twilio_account_sid, twilio.account_sid);
            set_opt(&mut self.twilio_auth_token, twilio.auth_token);
            set_opt(&mut self.outbound_caller_number, twilio.outbound_caller_number);
        }
        if let Some(security) = yaml.security {
            set(
                &mut self.rate_limit_requests_per_second,
                security.rate_limit_requests_per_second,
            );
            set(&mut self.rate_limit_burst_size, security.rate_limit_burst_size);
        }
        if let Some(endpoints) = yaml.endpoints {
            set_opt(&mut self.endpoints.deepgram_url, endpoints.deepgram_url);
            set_opt(&mut self.endpoints.azure_tts_url, endpoints.azure_tts_url);
            set_opt(&mut self.endpoints.elevenlabs_url, endpoints.elevenlabs_url);
            set_opt(&mut self.endpoints.openai_url, endpoints.openai_url);
            set_opt(&mut self.endpoints.twilio_api_url, endpoints.twilio_api_url);
        }
        set(&mut self.profiles, yaml.profiles);
    }

    fn apply_outbound_caller(&mut self) {
        if let Some(ref number) = self.outbound_caller_number {
            self.profiles.outbound.from_phone = number.clone();
        }
    }

    /// Check values that would only fail later, mid-call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_requests_per_second > 0 && self.rate_limit_burst_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RATE_LIMIT_BURST_SIZE".into(),
                value: "0".into(),
                reason: "burst size must be positive when rate limiting is enabled".into(),
            });
        }
        validate_phone_number(&self.profiles.outbound.from_phone).map_err(|e| {
            ConfigError::InvalidProfiles(format!("outbound from_phone: {e}"))
        })?;
        Ok(())
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_requests_per_second > 0
    }

    /// Twilio credentials, empty when not configured (rejected when a call is set up).
    pub fn twilio_config(&self) -> TwilioConfig {
        TwilioConfig::new(
            self.twilio_account_sid.clone().unwrap_or_default(),
            self.twilio_auth_token.clone().unwrap_or_default(),
        )
    }

    pub fn has_twilio_credentials(&self) -> bool {
        self.twilio_account_sid.is_some() && self.twilio_auth_token.is_some()
    }

    /// Get API key for a specific provider
    ///
    /// # Example
    /// ```rust,no_run
    /// use callbot_gateway::config::ServerConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ServerConfig::from_env()?;
    /// let api_key = config.get_api_key("deepgram")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_api_key(&self, provider: &str) -> Result<String, ConfigError> {
        let (key, name) = match provider.to_lowercase().as_str() {
            "deepgram" => (&self.deepgram_api_key, "Deepgram API key"),
            "azure" | "microsoft-azure" => (&self.azure_speech_key, "Azure Speech key"),
            "elevenlabs" | "eleven_labs" => (&self.elevenlabs_api_key, "ElevenLabs API key"),
            "openai" => (&self.openai_api_key, "OpenAI API key"),
            "ngrok" => (&self.ngrok_auth_token, "ngrok auth token"),
            other => return Err(ConfigError::UnsupportedProvider(other.to_string())),
        };
        key.clone()
            .ok_or_else(|| ConfigError::MissingKey(name.to_string()))
    }

    pub fn get_azure_speech_region(&self) -> String {
        self.azure_speech_region
            .clone()
            .unwrap_or_else(|| DEFAULT_AZURE_SPEECH_REGION.to_string())
    }
}
