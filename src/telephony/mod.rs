//! Twilio telephony: call setup, webhooks and media-stream conversations.

pub mod call;
pub mod config_manager;
pub mod conversation;
pub mod error;
pub mod media;
pub mod outbound;
pub mod server;
pub mod twilio;
pub mod twiml;

pub use call::{CallConfig, CallDirection, InboundCallProfile, OutboundCallProfile};
pub use config_manager::{ConfigManager, DEFAULT_CALL_CONFIG_TTL, InMemoryConfigManager};
pub use conversation::{ConversationSummary, StreamingConversation};
pub use error::{TelephonyError, TelephonyResult};
pub use outbound::OutboundCall;
pub use server::{OUTBOUND_CALL_ROUTE, TelephonyServer};
pub use twilio::{TwilioClient, TwilioConfig};
pub use twiml::TwimlBuilder;
