//! Messages exchanged with the Deepgram live transcription WebSocket.

use serde::{Deserialize, Serialize};

use crate::core::stt::base::Transcription;

#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsMessage {
    pub channel: Channel,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub speech_final: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub message: String,
}

/// Server-to-client messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum DeepgramMessage {
    Results(ResultsMessage),
    Metadata,
    SpeechStarted,
    UtteranceEnd,
    Error(ErrorMessage),
    #[serde(other)]
    Unknown,
}

impl DeepgramMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ResultsMessage {
    /// Best alternative as a [`Transcription`], if Deepgram returned one.
    pub fn to_transcription(&self) -> Option<Transcription> {
        let best = self.channel.alternatives.first()?;
        Some(Transcription {
            text: best.transcript.clone(),
            confidence: best.confidence,
            is_final: self.is_final,
            speech_final: self.speech_final,
        })
    }
}

/// Client-to-server control messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    KeepAlive,
    CloseStream,
}

impl ControlMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_result() {
        let raw = r#"{
            "type": "Results",
            "channel_index": [0, 1],
            "duration": 1.2,
            "start": 0.0,
            "is_final": true,
            "speech_final": true,
            "channel": {"alternatives": [{"transcript": "hola", "confidence": 0.97, "words": []}]}
        }"#;

        let msg = DeepgramMessage::parse(raw).unwrap();
        let DeepgramMessage::Results(results) = msg else {
            panic!("expected Results");
        };
        let transcription = results.to_transcription().unwrap();
        assert_eq!(transcription.text, "hola");
        assert!(transcription.is_final);
        assert!(transcription.speech_final);
    }

    #[test]
    fn test_parse_results_without_alternatives() {
        let raw = r#"{"type": "Results", "is_final": false, "channel": {"alternatives": []}}"#;
        let DeepgramMessage::Results(results) = DeepgramMessage::parse(raw).unwrap() else {
            panic!("expected Results");
        };
        assert!(results.to_transcription().is_none());
    }

    #[test]
    fn test_parse_unknown_type() {
        let raw = r#"{"type": "SomethingNew", "foo": 1}"#;
        assert!(matches!(
            DeepgramMessage::parse(raw).unwrap(),
            DeepgramMessage::Unknown
        ));
    }

    #[test]
    fn test_control_messages() {
        assert_eq!(ControlMessage::KeepAlive.to_json(), r#"{"type":"KeepAlive"}"#);
        assert_eq!(
            ControlMessage::CloseStream.to_json(),
            r#"{"type":"CloseStream"}"#
        );
    }
}
