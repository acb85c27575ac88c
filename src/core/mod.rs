pub mod agent;
pub mod audio;
pub mod providers;
pub mod stt;
pub mod tts;

pub use agent::{Agent, AgentConfig, AgentError, AgentFactory, SpellerAgentFactory};
pub use audio::{AudioEncoding, TELEPHONE_SAMPLING_RATE};
pub use providers::{DefaultProviderFactory, ProviderFactory};
pub use stt::{STTError, Transcriber, TranscriberConfig, create_transcriber};
pub use tts::{Synthesizer, SynthesizerConfig, TTSError, create_synthesizer};
