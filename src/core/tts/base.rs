use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::core::audio::AudioEncoding;

/// Errors raised by text-to-speech providers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TTSError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },
}

pub type TTSResult<T> = Result<T, TTSError>;

impl From<reqwest::Error> for TTSError {
    fn from(e: reqwest::Error) -> Self {
        TTSError::NetworkError(e.to_string())
    }
}

/// Synthesized audio for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    pub data: Bytes,
    pub encoding: AudioEncoding,
    pub sampling_rate: u32,
}

impl AudioData {
    /// Playback length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        let bytes_per_second = self.sampling_rate as u64 * self.encoding.bytes_per_sample() as u64;
        if bytes_per_second == 0 {
            return 0;
        }
        self.data.len() as u64 * 1000 / bytes_per_second
    }
}

/// Text-to-speech provider.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` to audio in the configured encoding.
    async fn synthesize(&self, text: &str) -> TTSResult<AudioData>;

    /// Provider name used in logs.
    fn provider_name(&self) -> &'static str;
}

/// Turn a non-success HTTP response into a [`TTSError::ProviderError`].
pub(crate) async fn error_from_response(response: reqwest::Response) -> TTSError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    TTSError::ProviderError { status, message }
}
