//! Deepgram streaming speech-to-text.
//!
//! Audio is streamed over `wss://api.deepgram.com/v1/listen` as raw binary
//! frames in the call's native encoding; results arrive as JSON `Results`
//! messages with `is_final` / `speech_final` flags.

mod client;
mod config;
mod messages;

pub use client::DeepgramTranscriber;
pub use config::{DEEPGRAM_STT_URL, DEFAULT_CHUNK_SIZE, DeepgramTranscriberConfig};
pub use messages::{ControlMessage, DeepgramMessage, ResultsMessage};
