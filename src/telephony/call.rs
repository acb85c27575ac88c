//! Per-call configuration and the profiles calls are built from.

use serde::{Deserialize, Serialize};

use super::error::{TelephonyError, TelephonyResult};
use super::twilio::TwilioConfig;
use crate::core::agent::AgentConfig;
use crate::core::stt::TranscriberConfig;
use crate::core::tts::SynthesizerConfig;
use crate::utils::phone::validate_phone_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// Everything needed to run one conversation, stored while the call lives.
#[derive(Debug, Clone)]
pub struct CallConfig {
    pub conversation_id: String,
    pub direction: CallDirection,
    pub from_phone: String,
    pub to_phone: String,
    pub twilio_sid: Option<String>,
    pub transcriber_config: TranscriberConfig,
    pub synthesizer_config: SynthesizerConfig,
    pub agent_config: AgentConfig,
    pub twilio_config: TwilioConfig,
}

impl CallConfig {
    pub fn validate(&self) -> TelephonyResult<()> {
        if self.conversation_id.trim().is_empty() {
            return Err(TelephonyError::InvalidConfiguration(
                "conversation id must not be empty".into(),
            ));
        }
        match self.direction {
            // Caller ID can be withheld on inbound calls, only require something.
            CallDirection::Inbound => {
                if self.from_phone.trim().is_empty() || self.to_phone.trim().is_empty() {
                    return Err(TelephonyError::InvalidConfiguration(
                        "inbound call is missing From or To".into(),
                    ));
                }
            }
            CallDirection::Outbound => {
                validate_phone_number(&self.from_phone)?;
                validate_phone_number(&self.to_phone)?;
            }
        }
        self.twilio_config.validate()?;
        validate_media_configs(
            &self.transcriber_config,
            &self.synthesizer_config,
            &self.agent_config,
        )
    }
}

/// Shared checks for the three provider configs of a telephone call.
pub fn validate_media_configs(
    transcriber: &TranscriberConfig,
    synthesizer: &SynthesizerConfig,
    agent: &AgentConfig,
) -> TelephonyResult<()> {
    transcriber.validate()?;
    synthesizer.validate()?;
    agent.validate()?;

    if !transcriber.accepts_telephone_audio() {
        return Err(TelephonyError::InvalidConfiguration(format!(
            "transcriber must take mulaw at 8000 Hz, got {} at {} Hz",
            transcriber.audio_encoding(),
            transcriber.sampling_rate()
        )));
    }
    if !synthesizer.produces_telephone_audio() {
        return Err(TelephonyError::InvalidConfiguration(format!(
            "synthesizer must produce mulaw at 8000 Hz, got {} at {} Hz",
            synthesizer.audio_encoding(),
            synthesizer.sampling_rate()
        )));
    }
    Ok(())
}

/// Bot served on an inbound webhook path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundCallProfile {
    pub url: String,
    pub transcriber_config: TranscriberConfig,
    pub synthesizer_config: SynthesizerConfig,
    pub agent_config: AgentConfig,
}

impl InboundCallProfile {
    pub fn validate(&self) -> TelephonyResult<()> {
        validate_route(&self.url)?;
        validate_media_configs(
            &self.transcriber_config,
            &self.synthesizer_config,
            &self.agent_config,
        )
    }
}

/// Bot used when the server dials out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCallProfile {
    pub from_phone: String,
    pub transcriber_config: TranscriberConfig,
    pub synthesizer_config: SynthesizerConfig,
    pub agent_config: AgentConfig,
}

/// A webhook path must be absolute, without whitespace, query or fragment.
pub fn validate_route(path: &str) -> TelephonyResult<()> {
    let valid = path.starts_with('/')
        && path.len() > 1
        && !path.chars().any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '{' | '}'));
    if valid {
        Ok(())
    } else {
        Err(TelephonyError::InvalidRoute(path.to_string()))
    }
}
