//! ElevenLabs text-to-speech.

mod config;
mod provider;

pub use config::{DEFAULT_ELEVENLABS_VOICE_ID, ElevenLabsSynthesizerConfig};
pub use provider::{ELEVENLABS_TTS_URL, ElevenLabsSynthesizer};
