use serde::{Deserialize, Serialize};

use crate::core::audio::{AudioEncoding, TELEPHONE_SAMPLING_RATE};
use crate::core::tts::base::{TTSError, TTSResult};

/// Azure Neural voice settings for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureSynthesizerConfig {
    /// Voice short name, e.g. `es-CO-GonzaloNeural`
    pub voice_name: String,
    /// Locale of the voice, e.g. `es-CO`
    pub language_code: String,
    pub sampling_rate: u32,
    pub audio_encoding: AudioEncoding,
}

impl AzureSynthesizerConfig {
    pub fn from_telephone_output_device(
        voice_name: impl Into<String>,
        language_code: impl Into<String>,
    ) -> Self {
        Self {
            voice_name: voice_name.into(),
            language_code: language_code.into(),
            sampling_rate: TELEPHONE_SAMPLING_RATE,
            audio_encoding: AudioEncoding::Mulaw,
        }
    }

    pub fn validate(&self) -> TTSResult<()> {
        if self.voice_name.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Azure voice name must not be empty".into(),
            ));
        }
        if self.language_code.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Azure language code must not be empty".into(),
            ));
        }
        self.output_format()?;
        Ok(())
    }

    /// Value of the `X-Microsoft-OutputFormat` header.
    pub fn output_format(&self) -> TTSResult<&'static str> {
        match (self.audio_encoding, self.sampling_rate) {
            (AudioEncoding::Mulaw, 8000) => Ok("raw-8khz-8bit-mono-mulaw"),
            (AudioEncoding::Linear16, 8000) => Ok("raw-8khz-16bit-mono-pcm"),
            (AudioEncoding::Linear16, 16000) => Ok("raw-16khz-16bit-mono-pcm"),
            (AudioEncoding::Linear16, 24000) => Ok("raw-24khz-16bit-mono-pcm"),
            (AudioEncoding::Linear16, 48000) => Ok("raw-48khz-16bit-mono-pcm"),
            (encoding, rate) => Err(TTSError::InvalidConfiguration(format!(
                "Azure has no raw output format for {encoding} at {rate} Hz"
            ))),
        }
    }
}
