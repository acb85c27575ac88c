//! Twilio-facing HTTP surface: inbound webhooks and the media stream.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::{SinkExt, StreamExt, future};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::call::{CallConfig, CallDirection, InboundCallProfile};
use super::config_manager::ConfigManager;
use super::conversation::StreamingConversation;
use super::error::{TelephonyError, TelephonyResult};
use super::twilio::{TwilioCallRequest, TwilioConfig};
use super::twiml::{CONNECT_CALL_PATH, TwimlBuilder};
use crate::core::agent::AgentFactory;
use crate::core::providers::ProviderFactory;

/// Route the app uses to trigger outbound calls. Profiles may not claim it.
pub const OUTBOUND_CALL_ROUTE: &str = "/outbound_call";

const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

const WEBHOOK_FAILURE_MESSAGE: &str = "Sorry, this line is not available right now.";

struct ServerState {
    base_url: String,
    config_manager: Arc<dyn ConfigManager>,
    agent_factory: Arc<dyn AgentFactory>,
    provider_factory: Arc<dyn ProviderFactory>,
    twilio_config: TwilioConfig,
}

pub struct TelephonyServer {
    state: Arc<ServerState>,
    inbound_profiles: Vec<Arc<InboundCallProfile>>,
}

impl TelephonyServer {
    pub fn new(
        base_url: impl Into<String>,
        config_manager: Arc<dyn ConfigManager>,
        inbound_profiles: Vec<InboundCallProfile>,
        agent_factory: Arc<dyn AgentFactory>,
        provider_factory: Arc<dyn ProviderFactory>,
        twilio_config: TwilioConfig,
    ) -> TelephonyResult<Self> {
        let mut seen = HashSet::new();
        for profile in &inbound_profiles {
            profile.validate()?;
            if profile.url == OUTBOUND_CALL_ROUTE || profile.url.starts_with(CONNECT_CALL_PATH) {
                return Err(TelephonyError::InvalidRoute(profile.url.clone()));
            }
            if !seen.insert(profile.url.as_str()) {
                return Err(TelephonyError::DuplicateRoute(profile.url.clone()));
            }
        }

        Ok(Self {
            state: Arc::new(ServerState {
                base_url: base_url.into(),
                config_manager,
                agent_factory,
                provider_factory,
                twilio_config,
            }),
            inbound_profiles: inbound_profiles.into_iter().map(Arc::new).collect(),
        })
    }

    /// Webhook paths served, in registration order.
    pub fn inbound_routes(&self) -> Vec<&str> {
        self.inbound_profiles.iter().map(|p| p.url.as_str()).collect()
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new().route(
            &format!("{CONNECT_CALL_PATH}/{{conversation_id}}"),
            get(connect_call),
        );

        for profile in &self.inbound_profiles {
            info!(route = %profile.url, voice = %profile.synthesizer_config.voice(), "Registering inbound call webhook");
            let profile = profile.clone();
            router = router.route(
                &profile.url.clone(),
                post(move |State(state): State<Arc<ServerState>>, form: Form<TwilioCallRequest>| {
                    inbound_call(state, profile.clone(), form)
                }),
            );
        }

        router.with_state(self.state.clone())
    }
}

fn twiml_response(twiml: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], twiml).into_response()
}

async fn inbound_call(
    state: Arc<ServerState>,
    profile: Arc<InboundCallProfile>,
    Form(request): Form<TwilioCallRequest>,
) -> Response {
    let conversation_id = Uuid::new_v4().to_string();
    info!(
        conversation_id = %conversation_id,
        call_sid = %request.call_sid,
        from = %request.from,
        route = %profile.url,
        "Inbound call"
    );

    let config = CallConfig {
        conversation_id: conversation_id.clone(),
        direction: CallDirection::Inbound,
        from_phone: request.from,
        to_phone: request.to,
        twilio_sid: Some(request.call_sid),
        transcriber_config: profile.transcriber_config.clone(),
        synthesizer_config: profile.synthesizer_config.clone(),
        agent_config: profile.agent_config.clone(),
        twilio_config: state.twilio_config.clone(),
    };

    let stored = match config.validate() {
        Ok(()) => state.config_manager.save_config(&conversation_id, config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = stored {
        error!(conversation_id = %conversation_id, "Rejecting inbound call: {}", e);
        return twiml_response(TwimlBuilder::error(WEBHOOK_FAILURE_MESSAGE));
    }

    twiml_response(TwimlBuilder::connect_call(&state.base_url, &conversation_id))
}

async fn connect_call(
    State(state): State<Arc<ServerState>>,
    Path(conversation_id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let config = match state.config_manager.get_config(&conversation_id).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            warn!(conversation_id = %conversation_id, "Media stream for unknown conversation");
            return (StatusCode::NOT_FOUND, "Unknown conversation").into_response();
        }
        Err(e) => {
            error!("Config lookup failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_socket(socket, state, config))
}

fn build_conversation(
    state: &ServerState,
    config: &CallConfig,
) -> TelephonyResult<StreamingConversation> {
    let transcriber = state
        .provider_factory
        .create_transcriber(&config.transcriber_config)?;
    let synthesizer = state
        .provider_factory
        .create_synthesizer(&config.synthesizer_config)?;
    let agent = state.agent_factory.create_agent(&config.agent_config)?;
    Ok(StreamingConversation::new(
        config.conversation_id.clone(),
        transcriber,
        synthesizer,
        agent,
    ))
}

async fn handle_media_socket(socket: WebSocket, state: Arc<ServerState>, config: CallConfig) {
    let conversation_id = config.conversation_id.clone();
    info!(conversation_id = %conversation_id, "Media stream connected");

    match build_conversation(&state, &config) {
        Ok(conversation) => {
            let (sender, receiver) = socket.split();
            let incoming = Box::pin(
                receiver
                    .take_while(|msg| future::ready(matches!(msg, Ok(m) if !matches!(m, Message::Close(_)))))
                    .filter_map(|msg| async move {
                        match msg {
                            Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                            _ => None,
                        }
                    }),
            );
            let outgoing = Box::pin(sender.with(|text: String| async move {
                Ok::<_, axum::Error>(Message::Text(text.into()))
            }));

            match conversation.run(incoming, outgoing).await {
                Ok(summary) => info!(
                    conversation_id = %conversation_id,
                    turns = summary.turns,
                    segments = summary.segments_spoken,
                    "Media stream finished"
                ),
                Err(e) => error!(conversation_id = %conversation_id, "Conversation failed: {}", e),
            }
        }
        Err(e) => {
            error!(conversation_id = %conversation_id, "Cannot set up conversation: {}", e);
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
        }
    }

    if let Err(e) = state.config_manager.delete_config(&conversation_id).await {
        warn!(conversation_id = %conversation_id, "Failed to delete call config: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::SpellerAgentFactory;
    use crate::core::providers::DefaultProviderFactory;
    use crate::telephony::call::tests::inbound_profile;
    use crate::telephony::config_manager::InMemoryConfigManager;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn server(
        manager: Arc<InMemoryConfigManager>,
        profiles: Vec<InboundCallProfile>,
    ) -> TelephonyResult<TelephonyServer> {
        TelephonyServer::new(
            "bot.example.com",
            manager,
            profiles,
            Arc::new(SpellerAgentFactory::default()),
            Arc::new(DefaultProviderFactory::default()),
            TwilioConfig::new("AC1", "token"),
        )
    }

    fn webhook(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(
                "CallSid=CA1&From=%2B573001112233&To=%2B15202239830",
            ))
            .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_routes() {
        let manager = Arc::new(InMemoryConfigManager::new());
        let result = server(
            manager,
            vec![
                inbound_profile("/inbound_call", "es-CO-GonzaloNeural"),
                inbound_profile("/inbound_call", "es-CO-SalomeNeural"),
            ],
        );
        assert!(matches!(result, Err(TelephonyError::DuplicateRoute(_))));
    }

    #[test]
    fn test_rejects_malformed_and_reserved_routes() {
        for url in ["inbound", "/outbound_call", "/connect_call/x"] {
            let manager = Arc::new(InMemoryConfigManager::new());
            let result = server(manager, vec![inbound_profile(url, "es-CO-GonzaloNeural")]);
            assert!(
                matches!(result, Err(TelephonyError::InvalidRoute(_))),
                "{url} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_webhook_returns_connect_twiml() {
        let manager = Arc::new(InMemoryConfigManager::new());
        let server = server(
            manager.clone(),
            vec![inbound_profile("/inbound_call", "es-CO-GonzaloNeural")],
        )
        .unwrap();

        let response = server.router().oneshot(webhook("/inbound_call")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();

        let ids = manager.conversation_ids();
        assert_eq!(ids.len(), 1);
        assert!(body.contains(&format!(
            "wss://bot.example.com/connect_call/{}",
            ids[0]
        )));

        let stored = manager.get_config(&ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.direction, CallDirection::Inbound);
        assert_eq!(stored.twilio_sid.as_deref(), Some("CA1"));
        assert_eq!(stored.from_phone, "+573001112233");
    }

    #[tokio::test]
    async fn test_webhook_without_credentials_hangs_up() {
        let manager = Arc::new(InMemoryConfigManager::new());
        let server = TelephonyServer::new(
            "bot.example.com",
            manager.clone(),
            vec![inbound_profile("/inbound_call", "es-CO-GonzaloNeural")],
            Arc::new(SpellerAgentFactory::default()),
            Arc::new(DefaultProviderFactory::default()),
            TwilioConfig::new("", ""),
        )
        .unwrap();

        let response = server.router().oneshot(webhook("/inbound_call")).await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("<Hangup/>"));
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_404() {
        let manager = Arc::new(InMemoryConfigManager::new());
        let server = server(manager, vec![]).unwrap();

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/connect_call/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
