pub mod azure;
mod base;
pub mod elevenlabs;

pub use azure::{AZURE_TTS_URL, AzureSynthesizer, AzureSynthesizerConfig};
pub use base::{AudioData, Synthesizer, TTSError, TTSResult};
pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsSynthesizer, ElevenLabsSynthesizerConfig};

use serde::{Deserialize, Serialize};

use crate::core::audio::{AudioEncoding, is_telephone_format};

/// Synthesizer selection for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum SynthesizerConfig {
    Azure(AzureSynthesizerConfig),
    ElevenLabs(ElevenLabsSynthesizerConfig),
}

impl SynthesizerConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Azure(_) => "azure",
            Self::ElevenLabs(_) => "elevenlabs",
        }
    }

    pub fn audio_encoding(&self) -> AudioEncoding {
        match self {
            Self::Azure(c) => c.audio_encoding,
            Self::ElevenLabs(c) => c.audio_encoding,
        }
    }

    pub fn sampling_rate(&self) -> u32 {
        match self {
            Self::Azure(c) => c.sampling_rate,
            Self::ElevenLabs(c) => c.sampling_rate,
        }
    }

    /// Voice identifier as the provider names it.
    pub fn voice(&self) -> &str {
        match self {
            Self::Azure(c) => &c.voice_name,
            Self::ElevenLabs(c) => &c.voice_id,
        }
    }

    pub fn validate(&self) -> TTSResult<()> {
        match self {
            Self::Azure(c) => c.validate(),
            Self::ElevenLabs(c) => c.validate(),
        }
    }

    /// Whether the output can be written to a phone call as-is.
    pub fn produces_telephone_audio(&self) -> bool {
        is_telephone_format(self.audio_encoding(), self.sampling_rate())
    }
}

impl From<AzureSynthesizerConfig> for SynthesizerConfig {
    fn from(config: AzureSynthesizerConfig) -> Self {
        Self::Azure(config)
    }
}

impl From<ElevenLabsSynthesizerConfig> for SynthesizerConfig {
    fn from(config: ElevenLabsSynthesizerConfig) -> Self {
        Self::ElevenLabs(config)
    }
}

/// Server-side keys and endpoint overrides used to build synthesizers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynthesizerCredentials<'a> {
    pub azure_speech_key: Option<&'a str>,
    pub azure_speech_region: &'a str,
    pub azure_endpoint: Option<&'a str>,
    pub elevenlabs_api_key: Option<&'a str>,
    pub elevenlabs_base_url: Option<&'a str>,
}

/// Build a synthesizer for the given configuration.
pub fn create_synthesizer(
    config: &SynthesizerConfig,
    credentials: &SynthesizerCredentials<'_>,
) -> TTSResult<Box<dyn Synthesizer>> {
    match config {
        SynthesizerConfig::Azure(c) => {
            let key = credentials.azure_speech_key.ok_or_else(|| {
                TTSError::InvalidConfiguration(
                    "Azure Speech key not configured in server environment".into(),
                )
            })?;
            let mut synth = AzureSynthesizer::new(c.clone(), key, credentials.azure_speech_region)?;
            if let Some(endpoint) = credentials.azure_endpoint {
                synth = synth.with_endpoint(endpoint);
            }
            Ok(Box::new(synth))
        }
        SynthesizerConfig::ElevenLabs(c) => {
            let mut synth = ElevenLabsSynthesizer::new(c.clone(), credentials.elevenlabs_api_key)?;
            if let Some(url) = credentials.elevenlabs_base_url {
                synth = synth.with_base_url(url);
            }
            Ok(Box::new(synth))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_yaml_azure() {
        let yaml = r#"
provider: azure
voice_name: es-CO-SalomeNeural
language_code: es-CO
sampling_rate: 8000
audio_encoding: mulaw
"#;
        let config: SynthesizerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider_name(), "azure");
        assert_eq!(config.voice(), "es-CO-SalomeNeural");
        assert!(config.produces_telephone_audio());
    }

    #[test]
    fn test_tagged_yaml_elevenlabs_defaults_voice() {
        let yaml = "provider: elevenlabs\nsampling_rate: 8000\naudio_encoding: mulaw\n";
        let config: SynthesizerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.voice(), elevenlabs::DEFAULT_ELEVENLABS_VOICE_ID);
    }

    #[test]
    fn test_create_synthesizer_requires_server_key_for_azure() {
        let config: SynthesizerConfig =
            AzureSynthesizerConfig::from_telephone_output_device("es-CO-GonzaloNeural", "es-CO")
                .into();
        let result = create_synthesizer(&config, &SynthesizerCredentials::default());
        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));

        let credentials = SynthesizerCredentials {
            azure_speech_key: Some("key"),
            azure_speech_region: "eastus",
            ..Default::default()
        };
        let synth = create_synthesizer(&config, &credentials).unwrap();
        assert_eq!(synth.provider_name(), "azure");
    }

    #[test]
    fn test_create_synthesizer_elevenlabs_with_embedded_key() {
        let config: SynthesizerConfig =
            ElevenLabsSynthesizerConfig::from_telephone_output_device(Some("k".into())).into();
        let synth = create_synthesizer(&config, &SynthesizerCredentials::default()).unwrap();
        assert_eq!(synth.provider_name(), "elevenlabs");
    }
}
