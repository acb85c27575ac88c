use serde::{Deserialize, Serialize};

use crate::core::audio::{AudioEncoding, TELEPHONE_SAMPLING_RATE};
use crate::core::tts::base::{TTSError, TTSResult};

/// ElevenLabs "Rachel", the provider's stock voice.
pub const DEFAULT_ELEVENLABS_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// ElevenLabs voice settings for one call.
///
/// Unlike the Azure variant this config may carry its own API key; when it
/// is absent the server-wide `ELEVEN_LABS_API_KEY` is used.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevenLabsSynthesizerConfig {
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    pub sampling_rate: u32,
    pub audio_encoding: AudioEncoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
}

fn default_voice_id() -> String {
    DEFAULT_ELEVENLABS_VOICE_ID.to_string()
}

impl std::fmt::Debug for ElevenLabsSynthesizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsSynthesizerConfig")
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("sampling_rate", &self.sampling_rate)
            .field("audio_encoding", &self.audio_encoding)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("stability", &self.stability)
            .field("similarity_boost", &self.similarity_boost)
            .finish()
    }
}

impl ElevenLabsSynthesizerConfig {
    /// Settings for writing straight into a phone call (mulaw at 8 kHz).
    pub fn from_telephone_output_device(api_key: Option<String>) -> Self {
        Self {
            voice_id: default_voice_id(),
            model_id: None,
            sampling_rate: TELEPHONE_SAMPLING_RATE,
            audio_encoding: AudioEncoding::Mulaw,
            api_key,
            stability: None,
            similarity_boost: None,
        }
    }

    pub fn validate(&self) -> TTSResult<()> {
        if self.voice_id.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "ElevenLabs voice id must not be empty".into(),
            ));
        }
        self.output_format()?;
        Ok(())
    }

    /// Value of the `output_format` query parameter.
    pub fn output_format(&self) -> TTSResult<String> {
        match (self.audio_encoding, self.sampling_rate) {
            (AudioEncoding::Mulaw, 8000) => Ok("ulaw_8000".to_string()),
            (AudioEncoding::Linear16, rate @ (16000 | 22050 | 24000 | 44100)) => {
                Ok(format!("pcm_{rate}"))
            }
            (encoding, rate) => Err(TTSError::InvalidConfiguration(format!(
                "ElevenLabs has no output format for {encoding} at {rate} Hz"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telephone_output_device() {
        let config = ElevenLabsSynthesizerConfig::from_telephone_output_device(Some("k".into()));
        assert_eq!(config.voice_id, DEFAULT_ELEVENLABS_VOICE_ID);
        assert_eq!(config.output_format().unwrap(), "ulaw_8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pcm_formats() {
        let mut config = ElevenLabsSynthesizerConfig::from_telephone_output_device(None);
        config.audio_encoding = AudioEncoding::Linear16;
        config.sampling_rate = 22050;
        assert_eq!(config.output_format().unwrap(), "pcm_22050");

        config.sampling_rate = 8000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config =
            ElevenLabsSynthesizerConfig::from_telephone_output_device(Some("sk-secret".into()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
