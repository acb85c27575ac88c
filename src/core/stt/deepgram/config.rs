//! Configuration for Deepgram live transcription.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::audio::{AudioEncoding, TELEPHONE_SAMPLING_RATE};
use crate::core::stt::base::{STTError, STTResult};

/// Default streaming endpoint.
pub const DEEPGRAM_STT_URL: &str = "wss://api.deepgram.com/v1/listen";

/// Bytes of audio buffered before a frame is sent to Deepgram.
pub const DEFAULT_CHUNK_SIZE: usize = 20 * 160;

/// Silence after the last word before Deepgram sends `UtteranceEnd`.
pub const UTTERANCE_END_MS: u32 = 1000;

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// How one call should be transcribed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepgramTranscriberConfig {
    /// BCP-47 language tag, e.g. `es` or `en-US`
    pub language: String,
    pub sampling_rate: u32,
    pub audio_encoding: AudioEncoding,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Deepgram model, provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Silence (ms) after which Deepgram marks speech as final
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpointing_ms: Option<u32>,
}

impl DeepgramTranscriberConfig {
    /// Settings matching a Twilio media stream (mulaw at 8 kHz).
    pub fn from_telephone_input_device(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            sampling_rate: TELEPHONE_SAMPLING_RATE,
            audio_encoding: AudioEncoding::Mulaw,
            chunk_size: DEFAULT_CHUNK_SIZE,
            model: None,
            endpointing_ms: None,
        }
    }

    pub fn validate(&self) -> STTResult<()> {
        if self.language.trim().is_empty() {
            return Err(STTError::ConfigurationError(
                "Transcriber language must not be empty".into(),
            ));
        }
        if self.sampling_rate == 0 {
            return Err(STTError::ConfigurationError(
                "Transcriber sampling rate must be positive".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(STTError::ConfigurationError(
                "Transcriber chunk size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Build the listen URL with the query parameters Deepgram expects.
    pub fn build_url(&self, base_url: &str) -> STTResult<Url> {
        let mut url = Url::parse(base_url)
            .map_err(|e| STTError::ConfigurationError(format!("Invalid Deepgram URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("encoding", self.audio_encoding.as_str())
                .append_pair("sample_rate", &self.sampling_rate.to_string())
                .append_pair("channels", "1")
                .append_pair("language", &self.language)
                .append_pair("interim_results", "true")
                .append_pair("utterance_end_ms", &UTTERANCE_END_MS.to_string())
                .append_pair("punctuate", "true");
            if let Some(ref model) = self.model {
                query.append_pair("model", model);
            }
            if let Some(ms) = self.endpointing_ms {
                query.append_pair("endpointing", &ms.to_string());
            }
        }
        Ok(url)
    }
}
