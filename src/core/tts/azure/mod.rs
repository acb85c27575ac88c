//! Microsoft Azure Speech text-to-speech.

mod config;
mod provider;

pub use config::AzureSynthesizerConfig;
pub use provider::{AZURE_TTS_URL, AzureSynthesizer, DEFAULT_AZURE_REGION};
