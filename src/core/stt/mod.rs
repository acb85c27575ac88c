mod base;
pub mod deepgram;

pub use base::{
    STTError, STTResult, Transcriber, TranscriberStream, Transcription, UtteranceBuffer,
};
pub use deepgram::{DEEPGRAM_STT_URL, DeepgramTranscriber, DeepgramTranscriberConfig};

use serde::{Deserialize, Serialize};

use crate::core::audio::{AudioEncoding, is_telephone_format};

/// Transcriber selection for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum TranscriberConfig {
    Deepgram(DeepgramTranscriberConfig),
}

impl TranscriberConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Deepgram(_) => "deepgram",
        }
    }

    pub fn audio_encoding(&self) -> AudioEncoding {
        match self {
            Self::Deepgram(c) => c.audio_encoding,
        }
    }

    pub fn sampling_rate(&self) -> u32 {
        match self {
            Self::Deepgram(c) => c.sampling_rate,
        }
    }

    pub fn language(&self) -> &str {
        match self {
            Self::Deepgram(c) => &c.language,
        }
    }

    pub fn validate(&self) -> STTResult<()> {
        match self {
            Self::Deepgram(c) => c.validate(),
        }
    }

    /// Whether the transcriber accepts phone audio without conversion.
    pub fn accepts_telephone_audio(&self) -> bool {
        is_telephone_format(self.audio_encoding(), self.sampling_rate())
    }
}

impl From<DeepgramTranscriberConfig> for TranscriberConfig {
    fn from(config: DeepgramTranscriberConfig) -> Self {
        Self::Deepgram(config)
    }
}

/// Build a transcriber for the given configuration.
pub fn create_transcriber(
    config: &TranscriberConfig,
    api_key: &str,
    base_url: Option<&str>,
) -> STTResult<Box<dyn Transcriber>> {
    match config {
        TranscriberConfig::Deepgram(c) => {
            let mut transcriber = DeepgramTranscriber::new(c.clone(), api_key)?;
            if let Some(url) = base_url {
                transcriber = transcriber.with_base_url(url);
            }
            Ok(Box::new(transcriber))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_yaml() {
        let yaml = r#"
provider: deepgram
language: es
sampling_rate: 8000
audio_encoding: mulaw
chunk_size: 1000
"#;
        let config: TranscriberConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider_name(), "deepgram");
        assert_eq!(config.language(), "es");
        assert!(config.accepts_telephone_audio());
        let TranscriberConfig::Deepgram(inner) = config;
        assert_eq!(inner.chunk_size, 1000);
    }

    #[test]
    fn test_create_transcriber() {
        let config: TranscriberConfig =
            DeepgramTranscriberConfig::from_telephone_input_device("es").into();
        let transcriber = create_transcriber(&config, "key", None).unwrap();
        assert_eq!(transcriber.provider_name(), "deepgram");

        assert!(matches!(
            create_transcriber(&config, "", None),
            Err(STTError::AuthenticationFailed(_))
        ));
    }
}
