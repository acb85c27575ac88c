//! One phone conversation over a Twilio media stream.
//!
//! ```text
//! Twilio media ──▶ transcriber ──▶ finished utterance ──▶ agent
//!      ▲                                                    │
//!      └──────── media + mark ◀── synthesizer ◀── reply segments
//! ```
//!
//! Final transcript pieces are joined until the transcriber reports the end
//! of speech; only then does the agent answer.
//!
//! Turns are strictly sequential: while the bot is answering, inbound audio
//! waits in the socket until the reply has been sent.

use std::fmt::Display;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::error::{TelephonyError, TelephonyResult};
use super::media::{OutboundMessage, StreamEvent};
use crate::core::agent::Agent;
use crate::core::stt::{Transcriber, UtteranceBuffer};
use crate::core::tts::Synthesizer;

/// 200 ms of mulaw audio at 8 kHz.
pub const OUTBOUND_CHUNK_SIZE: usize = 1600;

const REPLY_CHANNEL_CAPACITY: usize = 8;

/// What happened during a finished conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSummary {
    pub stream_sid: Option<String>,
    pub call_sid: Option<String>,
    /// Caller utterances the agent answered.
    pub turns: usize,
    /// Reply segments spoken, the greeting included.
    pub segments_spoken: usize,
}

pub struct StreamingConversation {
    conversation_id: String,
    transcriber: Box<dyn Transcriber>,
    synthesizer: Box<dyn Synthesizer>,
    agent: Box<dyn Agent>,
}

impl StreamingConversation {
    pub fn new(
        conversation_id: impl Into<String>,
        transcriber: Box<dyn Transcriber>,
        synthesizer: Box<dyn Synthesizer>,
        agent: Box<dyn Agent>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            transcriber,
            synthesizer,
            agent,
        }
    }

    /// Drive the conversation until the stream stops.
    ///
    /// `incoming` yields the raw text frames Twilio sends; `outgoing`
    /// accepts the JSON frames sent back.
    pub async fn run<S, K>(self, mut incoming: S, mut outgoing: K) -> TelephonyResult<ConversationSummary>
    where
        S: Stream<Item = String> + Unpin + Send,
        K: Sink<String> + Unpin + Send,
        K::Error: Display,
    {
        let Self {
            conversation_id,
            transcriber,
            synthesizer,
            mut agent,
        } = self;
        let mut summary = ConversationSummary::default();

        let Some((stream_sid, call_sid)) = wait_for_start(&mut incoming).await? else {
            info!(conversation_id = %conversation_id, "Media stream closed before start");
            return Ok(summary);
        };
        info!(
            conversation_id = %conversation_id,
            stream_sid = %stream_sid,
            transcriber = transcriber.provider_name(),
            synthesizer = synthesizer.provider_name(),
            agent = agent.agent_type(),
            "Media stream started"
        );
        summary.stream_sid = Some(stream_sid.clone());
        summary.call_sid = call_sid;

        let mut transcription = transcriber.start().await?;
        let mut pending = UtteranceBuffer::default();

        if let Some(greeting) = agent.initial_message().map(|m| m.text.clone()) {
            speak(&*synthesizer, &mut outgoing, &stream_sid, &greeting, "greeting").await?;
            summary.segments_spoken += 1;
        }

        let outcome: TelephonyResult<()> = async {
            loop {
                tokio::select! {
                    frame = incoming.next() => {
                        let Some(frame) = frame else {
                            debug!("Media socket closed");
                            break;
                        };
                        match StreamEvent::parse(&frame) {
                            Ok(StreamEvent::Media { media }) => {
                                transcription.send_audio(media.decode()?).await?;
                            }
                            Ok(StreamEvent::Stop) => {
                                info!(conversation_id = %conversation_id, "Twilio stopped the stream");
                                break;
                            }
                            Ok(StreamEvent::Mark { mark }) => {
                                debug!(mark = %mark.name, "Playback reached mark");
                            }
                            Ok(StreamEvent::Dtmf { dtmf }) => {
                                debug!(digit = %dtmf.digit, "DTMF received");
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Ignoring media frame: {}", e),
                        }
                    }
                    result = transcription.results.recv() => {
                        let Some(result) = result else {
                            info!("Transcriber ended the session");
                            break;
                        };
                        let Some(utterance) = pending.push(&result) else {
                            continue;
                        };
                        info!(conversation_id = %conversation_id, "Caller: {}", utterance);
                        summary.turns += 1;
                        let turn = summary.turns;

                        let (segment_tx, mut segment_rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);
                        let produce = agent.respond(&utterance, segment_tx);
                        let consume = async {
                            let mut spoken = 0;
                            while let Some(segment) = segment_rx.recv().await {
                                info!(conversation_id = %conversation_id, "Bot: {}", segment);
                                let mark = format!("turn-{turn}-{spoken}");
                                speak(&*synthesizer, &mut outgoing, &stream_sid, &segment, &mark).await?;
                                spoken += 1;
                            }
                            Ok::<usize, TelephonyError>(spoken)
                        };
                        let (produced, spoken) = tokio::join!(produce, consume);
                        summary.segments_spoken += spoken?;
                        produced?;
                    }
                }
            }
            Ok(())
        }
        .await;

        transcription.finish().await;
        outcome?;
        info!(
            conversation_id = %conversation_id,
            turns = summary.turns,
            "Conversation finished"
        );
        Ok(summary)
    }
}

/// Skip frames until Twilio announces the stream. `None` if it never does.
async fn wait_for_start<S>(incoming: &mut S) -> TelephonyResult<Option<(String, Option<String>)>>
where
    S: Stream<Item = String> + Unpin,
{
    while let Some(frame) = incoming.next().await {
        match StreamEvent::parse(&frame) {
            Ok(StreamEvent::Start { stream_sid, start }) => {
                return Ok(Some((stream_sid, start.call_sid)));
            }
            Ok(StreamEvent::Stop) => return Ok(None),
            Ok(StreamEvent::Connected { protocol }) => {
                debug!(protocol = ?protocol, "Twilio media stream connected");
            }
            Ok(_) => {}
            Err(e) => warn!("Ignoring media frame before start: {}", e),
        }
    }
    Ok(None)
}

/// Synthesize `text` and send it as media frames followed by a mark.
async fn speak<K>(
    synthesizer: &dyn Synthesizer,
    outgoing: &mut K,
    stream_sid: &str,
    text: &str,
    mark: &str,
) -> TelephonyResult<()>
where
    K: Sink<String> + Unpin,
    K::Error: Display,
{
    let audio = synthesizer.synthesize(text).await?;
    debug!(
        bytes = audio.data.len(),
        duration_ms = audio.duration_ms(),
        "Sending synthesized audio"
    );
    for chunk in audio.data.chunks(OUTBOUND_CHUNK_SIZE) {
        send(outgoing, OutboundMessage::media(stream_sid, chunk)).await?;
    }
    send(outgoing, OutboundMessage::mark(stream_sid, mark)).await
}

async fn send<K>(outgoing: &mut K, message: OutboundMessage) -> TelephonyResult<()>
where
    K: Sink<String> + Unpin,
    K::Error: Display,
{
    outgoing
        .send(message.to_json())
        .await
        .map_err(|e| TelephonyError::Protocol(format!("media socket send failed: {e}")))
}
