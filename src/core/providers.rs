//! Builds the speech providers a call asks for, using the server's keys.

use crate::config::ServerConfig;
use crate::core::stt::{STTError, STTResult, Transcriber, TranscriberConfig, create_transcriber};
use crate::core::tts::{
    Synthesizer, SynthesizerConfig, SynthesizerCredentials, TTSResult, create_synthesizer,
};

pub trait ProviderFactory: Send + Sync {
    fn create_transcriber(&self, config: &TranscriberConfig) -> STTResult<Box<dyn Transcriber>>;

    fn create_synthesizer(&self, config: &SynthesizerConfig) -> TTSResult<Box<dyn Synthesizer>>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultProviderFactory {
    pub deepgram_api_key: Option<String>,
    pub deepgram_url: Option<String>,
    pub azure_speech_key: Option<String>,
    pub azure_speech_region: String,
    pub azure_tts_url: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_url: Option<String>,
}

impl DefaultProviderFactory {
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self {
            deepgram_api_key: config.deepgram_api_key.clone(),
            deepgram_url: config.endpoints.deepgram_url.clone(),
            azure_speech_key: config.azure_speech_key.clone(),
            azure_speech_region: config.get_azure_speech_region(),
            azure_tts_url: config.endpoints.azure_tts_url.clone(),
            elevenlabs_api_key: config.elevenlabs_api_key.clone(),
            elevenlabs_url: config.endpoints.elevenlabs_url.clone(),
        }
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create_transcriber(&self, config: &TranscriberConfig) -> STTResult<Box<dyn Transcriber>> {
        let key = self.deepgram_api_key.as_deref().ok_or_else(|| {
            STTError::AuthenticationFailed(
                "Deepgram API key not configured in server environment".into(),
            )
        })?;
        create_transcriber(config, key, self.deepgram_url.as_deref())
    }

    fn create_synthesizer(&self, config: &SynthesizerConfig) -> TTSResult<Box<dyn Synthesizer>> {
        let credentials = SynthesizerCredentials {
            azure_speech_key: self.azure_speech_key.as_deref(),
            azure_speech_region: &self.azure_speech_region,
            azure_endpoint: self.azure_tts_url.as_deref(),
            elevenlabs_api_key: self.elevenlabs_api_key.as_deref(),
            elevenlabs_base_url: self.elevenlabs_url.as_deref(),
        };
        create_synthesizer(config, &credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stt::DeepgramTranscriberConfig;
    use crate::core::tts::{AzureSynthesizerConfig, ElevenLabsSynthesizerConfig};

    #[test]
    fn test_missing_deepgram_key() {
        let factory = DefaultProviderFactory::default();
        let config = DeepgramTranscriberConfig::from_telephone_input_device("es").into();
        assert!(matches!(
            factory.create_transcriber(&config),
            Err(STTError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_builds_configured_providers() {
        let factory = DefaultProviderFactory {
            deepgram_api_key: Some("dg".into()),
            azure_speech_key: Some("az".into()),
            azure_speech_region: "eastus".into(),
            elevenlabs_api_key: Some("el".into()),
            ..Default::default()
        };

        let stt = DeepgramTranscriberConfig::from_telephone_input_device("es").into();
        assert_eq!(factory.create_transcriber(&stt).unwrap().provider_name(), "deepgram");

        let azure =
            AzureSynthesizerConfig::from_telephone_output_device("es-CO-SalomeNeural", "es-CO")
                .into();
        assert_eq!(factory.create_synthesizer(&azure).unwrap().provider_name(), "azure");

        let eleven = ElevenLabsSynthesizerConfig::from_telephone_output_device(None).into();
        assert_eq!(
            factory.create_synthesizer(&eleven).unwrap().provider_name(),
            "elevenlabs"
        );
    }
}
