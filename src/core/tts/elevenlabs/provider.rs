//! ElevenLabs REST synthesis.
//!
//! - Endpoint: `POST https://api.elevenlabs.io/v1/text-to-speech/{voice_id}`
//! - Auth: `xi-api-key`
//! - Output: selected with the `output_format` query parameter

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::config::ElevenLabsSynthesizerConfig;
use crate::core::tts::base::{
    AudioData, Synthesizer, TTSError, TTSResult, error_from_response,
};

pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: ElevenLabsSynthesizerConfig,
    api_key: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    /// The key embedded in the config wins over `fallback_api_key`.
    pub fn new(
        config: ElevenLabsSynthesizerConfig,
        fallback_api_key: Option<&str>,
    ) -> TTSResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| fallback_api_key.map(str::to_string))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TTSError::InvalidConfiguration("ElevenLabs API key is required".into())
            })?;
        config.validate()?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            api_key,
            base_url: ELEVENLABS_TTS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.config.voice_id
        )
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        let mut body = json!({ "text": text });
        if let Some(ref model_id) = self.config.model_id {
            body["model_id"] = json!(model_id);
        }
        if self.config.stability.is_some() || self.config.similarity_boost.is_some() {
            body["voice_settings"] = json!({
                "stability": self.config.stability.unwrap_or(0.5),
                "similarity_boost": self.config.similarity_boost.unwrap_or(0.75),
            });
        }
        body
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> TTSResult<AudioData> {
        let output_format = self.config.output_format()?;
        debug!(
            voice = %self.config.voice_id,
            chars = text.len(),
            "ElevenLabs synthesis request"
        );

        let response = self
            .client
            .post(self.request_url())
            .query(&[("output_format", output_format.as_str())])
            .header("xi-api-key", &self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(AudioData {
            data: response.bytes().await?,
            encoding: self.config.audio_encoding,
            sampling_rate: self.config.sampling_rate,
        })
    }

    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }
}
