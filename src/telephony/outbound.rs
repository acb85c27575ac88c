use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::call::{CallConfig, CallDirection, OutboundCallProfile};
use super::config_manager::ConfigManager;
use super::error::{TelephonyError, TelephonyResult};
use super::twilio::{TwilioClient, TwilioConfig};
use super::twiml::TwimlBuilder;
use crate::utils::phone::validate_phone_number;

/// A call the server places to a phone number.
///
/// `start` stores the call config under a fresh conversation id and asks
/// Twilio to dial; once the callee answers Twilio opens the media stream
/// for that id.
pub struct OutboundCall {
    base_url: String,
    config: CallConfig,
    config_manager: Arc<dyn ConfigManager>,
    twilio_api_base: Option<String>,
}

impl OutboundCall {
    pub fn new(
        base_url: impl Into<String>,
        to_phone: &str,
        profile: &OutboundCallProfile,
        twilio_config: TwilioConfig,
        config_manager: Arc<dyn ConfigManager>,
    ) -> TelephonyResult<Self> {
        let config = CallConfig {
            conversation_id: Uuid::new_v4().to_string(),
            direction: CallDirection::Outbound,
            from_phone: validate_phone_number(&profile.from_phone)?,
            to_phone: validate_phone_number(to_phone)?,
            twilio_sid: None,
            transcriber_config: profile.transcriber_config.clone(),
            synthesizer_config: profile.synthesizer_config.clone(),
            agent_config: profile.agent_config.clone(),
            twilio_config,
        };
        config.validate()?;

        Ok(Self {
            base_url: base_url.into(),
            config,
            config_manager,
            twilio_api_base: None,
        })
    }

    pub fn with_twilio_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.twilio_api_base = Some(api_base.into());
        self
    }

    pub fn conversation_id(&self) -> &str {
        &self.config.conversation_id
    }

    /// Twilio call SID, once started.
    pub fn twilio_sid(&self) -> Option<&str> {
        self.config.twilio_sid.as_deref()
    }

    fn client(&self) -> TelephonyResult<TwilioClient> {
        let client = TwilioClient::new(self.config.twilio_config.clone())?;
        Ok(match self.twilio_api_base {
            Some(ref base) => client.with_api_base(base.clone()),
            None => client,
        })
    }

    /// Place the call. Returns once Twilio has accepted it.
    pub async fn start(&mut self) -> TelephonyResult<()> {
        let conversation_id = self.config.conversation_id.clone();
        self.config_manager
            .save_config(&conversation_id, self.config.clone())
            .await?;

        let twiml = TwimlBuilder::connect_call(&self.base_url, &conversation_id);
        let created = match self.client() {
            Ok(client) => {
                client
                    .create_call(&self.config.to_phone, &self.config.from_phone, &twiml)
                    .await
            }
            Err(e) => Err(e),
        };

        let sid = match created {
            Ok(sid) => sid,
            Err(e) => {
                // Nothing will ever connect to this conversation.
                if let Err(cleanup) = self.config_manager.delete_config(&conversation_id).await {
                    warn!("Failed to drop config for {}: {}", conversation_id, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            conversation_id = %conversation_id,
            call_sid = %sid,
            to = %self.config.to_phone,
            "Outbound call started"
        );
        self.config.twilio_sid = Some(sid);
        self.config_manager
            .save_config(&conversation_id, self.config.clone())
            .await
    }

    /// Hang up and forget the call.
    pub async fn end(&mut self) -> TelephonyResult<()> {
        let sid = self
            .config
            .twilio_sid
            .clone()
            .ok_or(TelephonyError::NotStarted)?;
        self.client()?.end_call(&sid).await?;
        self.config_manager
            .delete_config(&self.config.conversation_id)
            .await?;
        info!(conversation_id = %self.config.conversation_id, "Outbound call ended");
        Ok(())
    }
}
