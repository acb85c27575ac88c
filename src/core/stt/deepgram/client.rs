//! Deepgram live transcription WebSocket client.
//!
//! ```text
//! send_audio() ──▶ audio_tx (mpsc) ──▶ ┌──────────────┐ ──▶ Deepgram
//!                                      │ WebSocket    │
//! results     ◀── result_tx (mpsc) ◀── │ task         │ ◀── Results
//!                                      └──────────────┘
//! ```
//!
//! Audio is buffered until `chunk_size` bytes are available and then sent as
//! one binary frame. A `KeepAlive` is sent while the caller is silent so the
//! provider does not close the socket.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use super::config::{DEEPGRAM_STT_URL, DeepgramTranscriberConfig};
use super::messages::{ControlMessage, DeepgramMessage};
use crate::core::stt::base::{
    STTError, STTResult, Transcriber, TranscriberStream, Transcription,
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Deepgram streaming transcriber.
#[derive(Debug, Clone)]
pub struct DeepgramTranscriber {
    config: DeepgramTranscriberConfig,
    api_key: String,
    base_url: String,
}

impl DeepgramTranscriber {
    pub fn new(config: DeepgramTranscriberConfig, api_key: impl Into<String>) -> STTResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(STTError::AuthenticationFailed(
                "Deepgram API key is required".into(),
            ));
        }
        config.validate()?;
        Ok(Self {
            config,
            api_key,
            base_url: DEEPGRAM_STT_URL.to_string(),
        })
    }

    /// Point the client at another listen endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn config(&self) -> &DeepgramTranscriberConfig {
        &self.config
    }
}

/// Forward one provider message to the result channel.
///
/// Returns `false` when the session should end.
async fn handle_provider_message(message: Message, result_tx: &mpsc::Sender<Transcription>) -> bool {
    match message {
        Message::Text(text) => match DeepgramMessage::parse(text.as_str()) {
            Ok(DeepgramMessage::Results(results)) => {
                if let Some(transcription) = results.to_transcription() {
                    if transcription.text.is_empty() && !transcription.is_final {
                        return true;
                    }
                    if result_tx.send(transcription).await.is_err() {
                        debug!("Transcription receiver dropped");
                        return false;
                    }
                }
                true
            }
            Ok(DeepgramMessage::Error(err)) => {
                error!(
                    "Deepgram error: {} {}",
                    err.message, err.description
                );
                false
            }
            Ok(DeepgramMessage::UtteranceEnd) => {
                if result_tx.send(Transcription::utterance_end()).await.is_err() {
                    debug!("Transcription receiver dropped");
                    return false;
                }
                true
            }
            Ok(DeepgramMessage::Metadata)
            | Ok(DeepgramMessage::SpeechStarted)
            | Ok(DeepgramMessage::Unknown) => true,
            Err(e) => {
                warn!("Unparseable Deepgram message: {}", e);
                true
            }
        },
        Message::Close(frame) => {
            info!("Deepgram closed the stream: {:?}", frame);
            false
        }
        _ => true,
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn start(&self) -> STTResult<TranscriberStream> {
        let url = self.config.build_url(&self.base_url)?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| STTError::ConnectionFailed(e.to_string()))?;
        let auth = HeaderValue::from_str(&format!("Token {}", self.api_key))
            .map_err(|e| STTError::AuthenticationFailed(e.to_string()))?;
        request.headers_mut().insert(http::header::AUTHORIZATION, auth);

        let (ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| STTError::ConnectionFailed(format!("Deepgram connect failed: {e}")))?;
        info!(
            language = %self.config.language,
            encoding = %self.config.audio_encoding,
            "Connected to Deepgram"
        );

        let (audio_tx, mut audio_rx) = mpsc::channel::<Bytes>(64);
        let (result_tx, result_rx) = mpsc::channel::<Transcription>(64);
        let chunk_size = self.config.chunk_size;

        let task = tokio::spawn(async move {
            let (mut ws_sink, mut ws_source) = ws_stream.split();
            let mut buffer = BytesMut::with_capacity(chunk_size * 2);
            let mut keep_alive = tokio::time::interval(KEEP_ALIVE_INTERVAL);
            keep_alive.tick().await;
            let mut audio_open = true;

            loop {
                tokio::select! {
                    chunk = audio_rx.recv(), if audio_open => {
                        match chunk {
                            Some(chunk) => {
                                buffer.extend_from_slice(&chunk);
                                if buffer.len() >= chunk_size {
                                    let frame = buffer.split().freeze();
                                    if let Err(e) = ws_sink.send(Message::Binary(frame)).await {
                                        error!("Failed to send audio to Deepgram: {}", e);
                                        break;
                                    }
                                    keep_alive.reset();
                                }
                            }
                            None => {
                                audio_open = false;
                                if !buffer.is_empty() {
                                    let frame = buffer.split().freeze();
                                    let _ = ws_sink.send(Message::Binary(frame)).await;
                                }
                                let close = ControlMessage::CloseStream.to_json();
                                if ws_sink.send(Message::Text(close.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    _ = keep_alive.tick(), if audio_open => {
                        let msg = ControlMessage::KeepAlive.to_json();
                        if ws_sink.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    incoming = ws_source.next() => {
                        match incoming {
                            Some(Ok(message)) => {
                                if !handle_provider_message(message, &result_tx).await {
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                error!("Deepgram WebSocket error: {}", e);
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            let _ = ws_sink.close().await;
            debug!("Deepgram session task finished");
        });

        Ok(TranscriberStream::new(audio_tx, result_rx, Some(task)))
    }

    fn provider_name(&self) -> &'static str {
        "deepgram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let config = DeepgramTranscriberConfig::from_telephone_input_device("es");
        let result = DeepgramTranscriber::new(config, "");
        assert!(matches!(result, Err(STTError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_new_validates_config() {
        let mut config = DeepgramTranscriberConfig::from_telephone_input_device("es");
        config.chunk_size = 0;
        let result = DeepgramTranscriber::new(config, "key");
        assert!(matches!(result, Err(STTError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_handle_final_result_forwards_transcription() {
        let (tx, mut rx) = mpsc::channel(4);
        let msg = Message::Text(
            r#"{"type":"Results","is_final":true,"speech_final":true,"channel":{"alternatives":[{"transcript":"buenos dias","confidence":0.9}]}}"#
                .into(),
        );

        assert!(handle_provider_message(msg, &tx).await);
        let transcription = rx.recv().await.unwrap();
        assert_eq!(transcription.text, "buenos dias");
        assert!(transcription.is_final);
    }

    #[tokio::test]
    async fn test_handle_empty_interim_is_skipped() {
        let (tx, mut rx) = mpsc::channel(4);
        let msg = Message::Text(
            r#"{"type":"Results","is_final":false,"channel":{"alternatives":[{"transcript":"","confidence":0.0}]}}"#
                .into(),
        );

        assert!(handle_provider_message(msg, &tx).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_utterance_end_marks_speech_final() {
        let (tx, mut rx) = mpsc::channel(4);
        let msg = Message::Text(
            r#"{"type":"UtteranceEnd","channel":[0,1],"last_word_end":2.1}"#.into(),
        );

        assert!(handle_provider_message(msg, &tx).await);
        let marker = rx.recv().await.unwrap();
        assert!(marker.speech_final);
        assert!(!marker.is_final);
        assert!(marker.text.is_empty());
    }

    #[tokio::test]
    async fn test_handle_close_ends_session() {
        let (tx, _rx) = mpsc::channel(4);
        assert!(!handle_provider_message(Message::Close(None), &tx).await);
    }

    #[tokio::test]
    async fn test_start_fails_when_unreachable() {
        let config = DeepgramTranscriberConfig::from_telephone_input_device("es");
        let transcriber = DeepgramTranscriber::new(config, "key")
            .unwrap()
            .with_base_url("ws://127.0.0.1:1/v1/listen");

        let result = transcriber.start().await;
        assert!(matches!(result, Err(STTError::ConnectionFailed(_))));
    }
}
