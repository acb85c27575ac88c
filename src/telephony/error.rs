use thiserror::Error;

use crate::core::agent::AgentError;
use crate::core::stt::STTError;
use crate::core::tts::TTSError;
use crate::utils::phone::PhoneNumberError;

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("Invalid call configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(#[from] PhoneNumberError),
    #[error("Webhook route {0} is registered twice")]
    DuplicateRoute(String),
    #[error("Invalid webhook route {0:?}: must start with '/' and contain no spaces")]
    InvalidRoute(String),
    #[error("Network error talking to Twilio: {0}")]
    Network(String),
    #[error("Twilio API error ({status}): {message}")]
    Twilio { status: u16, message: String },
    #[error("No call config stored for conversation {0}")]
    UnknownConversation(String),
    #[error("Call has not been started")]
    NotStarted,
    #[error("Media stream protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Transcriber(#[from] STTError),
    #[error(transparent)]
    Synthesizer(#[from] TTSError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub type TelephonyResult<T> = Result<T, TelephonyError>;

impl From<reqwest::Error> for TelephonyError {
    fn from(e: reqwest::Error) -> Self {
        TelephonyError::Network(e.to_string())
    }
}
