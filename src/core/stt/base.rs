use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors raised by speech-to-text providers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum STTError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Failed to send audio: {0}")]
    AudioProcessingError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
}

pub type STTResult<T> = Result<T, STTError>;

const FINISH_TIMEOUT: Duration = Duration::from_secs(5);

/// One transcription update emitted by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub text: String,
    pub confidence: f64,
    /// The text for this audio segment will not change any more.
    pub is_final: bool,
    /// The provider detected the end of the speaker's utterance.
    pub speech_final: bool,
}

impl Transcription {
    pub fn new(text: impl Into<String>, confidence: f64, is_final: bool) -> Self {
        Self {
            text: text.into(),
            confidence,
            is_final,
            speech_final: is_final,
        }
    }

    /// Marker for the provider detecting the end of an utterance without new text.
    pub fn utterance_end() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            is_final: false,
            speech_final: true,
        }
    }

    /// Settled text that belongs to the current utterance.
    pub fn has_final_text(&self) -> bool {
        self.is_final && !self.text.trim().is_empty()
    }
}

/// Joins settled transcript pieces until the speaker stops talking.
#[derive(Debug, Default)]
pub struct UtteranceBuffer {
    text: String,
}

impl UtteranceBuffer {
    /// Add `result`; returns the whole utterance once it is complete.
    pub fn push(&mut self, result: &Transcription) -> Option<String> {
        if result.has_final_text() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(result.text.trim());
        }
        if result.speech_final && !self.text.is_empty() {
            return Some(std::mem::take(&mut self.text));
        }
        None
    }
}

/// A running transcription session.
///
/// Audio goes in through [`TranscriberStream::send_audio`] and results come
/// out of [`TranscriberStream::results`]. Dropping the audio side (via
/// [`TranscriberStream::finish`]) asks the provider to flush and close.
pub struct TranscriberStream {
    audio_tx: Option<mpsc::Sender<Bytes>>,
    pub results: mpsc::Receiver<Transcription>,
    task: Option<JoinHandle<()>>,
    finish_timeout: Duration,
}

impl TranscriberStream {
    pub fn new(
        audio_tx: mpsc::Sender<Bytes>,
        results: mpsc::Receiver<Transcription>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            audio_tx: Some(audio_tx),
            results,
            task,
            finish_timeout: FINISH_TIMEOUT,
        }
    }

    /// How long [`TranscriberStream::finish`] waits before aborting the task.
    pub fn with_finish_timeout(mut self, timeout: Duration) -> Self {
        self.finish_timeout = timeout;
        self
    }

    pub async fn send_audio(&self, chunk: Bytes) -> STTResult<()> {
        let sender = self
            .audio_tx
            .as_ref()
            .ok_or_else(|| STTError::AudioProcessingError("stream already finished".into()))?;
        sender
            .send(chunk)
            .await
            .map_err(|_| STTError::AudioProcessingError("transcriber task has stopped".into()))
    }

    /// Close the audio side and wait for the provider task to wind down.
    ///
    /// A task still running after the timeout is aborted, closing its socket.
    pub async fn finish(mut self) {
        self.audio_tx.take();
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(self.finish_timeout, task).await.is_err() {
                tracing::warn!(
                    "Transcriber task did not stop within {:?}, aborting",
                    self.finish_timeout
                );
                abort.abort();
            }
        }
    }
}

/// Speech-to-text provider able to open streaming sessions.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Open a new streaming session.
    async fn start(&self) -> STTResult<TranscriberStream>;

    /// Provider name used in logs.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(text: &str, speech_final: bool) -> Transcription {
        Transcription {
            text: text.into(),
            confidence: 0.9,
            is_final: true,
            speech_final,
        }
    }

    #[test]
    fn test_utterance_waits_for_speech_final() {
        let mut buffer = UtteranceBuffer::default();
        assert_eq!(buffer.push(&piece("quiero", false)), None);
        // Interim guesses never land in the utterance.
        assert_eq!(buffer.push(&Transcription::new("una piza", 0.5, false)), None);
        assert_eq!(buffer.push(&piece("una pizza", false)), None);
        assert_eq!(
            buffer.push(&piece("grande", true)).as_deref(),
            Some("quiero una pizza grande")
        );
        assert_eq!(buffer.push(&Transcription::utterance_end()), None);
    }

    #[test]
    fn test_utterance_end_flushes_pending_text() {
        let mut buffer = UtteranceBuffer::default();
        assert_eq!(buffer.push(&piece("hola", false)), None);
        assert_eq!(
            buffer.push(&Transcription::utterance_end()).as_deref(),
            Some("hola")
        );
    }

    #[test]
    fn test_blank_final_is_ignored() {
        let mut buffer = UtteranceBuffer::default();
        assert_eq!(buffer.push(&piece("   ", true)), None);
    }

    #[tokio::test]
    async fn test_send_audio_after_receiver_dropped() {
        let (audio_tx, audio_rx) = mpsc::channel(4);
        let (_result_tx, result_rx) = mpsc::channel(4);
        drop(audio_rx);

        let stream = TranscriberStream::new(audio_tx, result_rx, None);
        let err = stream.send_audio(Bytes::from_static(b"\xff")).await;
        assert!(matches!(err, Err(STTError::AudioProcessingError(_))));
    }

    #[tokio::test]
    async fn test_finish_closes_audio_channel() {
        let (audio_tx, mut audio_rx) = mpsc::channel(4);
        let (_result_tx, result_rx) = mpsc::channel(4);

        let stream = TranscriberStream::new(audio_tx, result_rx, None);
        stream.send_audio(Bytes::from_static(b"ab")).await.unwrap();
        stream.finish().await;

        assert_eq!(audio_rx.recv().await, Some(Bytes::from_static(b"ab")));
        assert_eq!(audio_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_finish_aborts_stuck_task() {
        let (audio_tx, _audio_rx) = mpsc::channel(4);
        let (_result_tx, result_rx) = mpsc::channel(4);
        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });

        let stream = TranscriberStream::new(audio_tx, result_rx, Some(task))
            .with_finish_timeout(Duration::from_millis(20));
        stream.finish().await;

        // The sender is dropped with the aborted task.
        assert!(
            tokio::time::timeout(Duration::from_secs(1), alive_rx)
                .await
                .unwrap()
                .is_err()
        );
    }
}
