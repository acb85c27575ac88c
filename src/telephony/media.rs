//! Twilio media-stream WebSocket messages.
//!
//! Audio travels as base64 mulaw at 8 kHz in both directions.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::{TelephonyError, TelephonyResult};

/// Events Twilio sends on the stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    Connected {
        #[serde(default)]
        protocol: Option<String>,
    },
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        start: StartMetadata,
    },
    Media {
        media: MediaPayload,
    },
    Mark {
        mark: MarkPayload,
    },
    Dtmf {
        dtmf: DtmfPayload,
    },
    Stop,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMetadata {
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub media_format: Option<MediaFormat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    pub payload: String,
}

impl MediaPayload {
    pub fn decode(&self) -> TelephonyResult<Bytes> {
        BASE64
            .decode(&self.payload)
            .map(Bytes::from)
            .map_err(|e| TelephonyError::Protocol(format!("invalid media payload: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DtmfPayload {
    pub digit: String,
}

impl StreamEvent {
    pub fn parse(text: &str) -> TelephonyResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| TelephonyError::Protocol(format!("invalid stream event: {e}")))
    }
}

/// Messages sent back to Twilio.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundMessage {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl OutboundMessage {
    pub fn media(stream_sid: &str, audio: &[u8]) -> Self {
        Self::Media {
            stream_sid: stream_sid.to_string(),
            media: MediaPayload {
                track: None,
                payload: BASE64.encode(audio),
            },
        }
    }

    pub fn mark(stream_sid: &str, name: impl Into<String>) -> Self {
        Self::Mark {
            stream_sid: stream_sid.to_string(),
            mark: MarkPayload { name: name.into() },
        }
    }

    pub fn to_json(&self) -> String {
        // Plain enum of strings, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let event = StreamEvent::parse(
            r#"{"event":"start","sequenceNumber":"1","streamSid":"MZ1","start":{"accountSid":"AC1","streamSid":"MZ1","callSid":"CA1","tracks":["inbound"],"mediaFormat":{"encoding":"audio/x-mulaw","sampleRate":8000,"channels":1}}}"#,
        )
        .unwrap();
        let StreamEvent::Start { stream_sid, start } = event else {
            panic!("expected start");
        };
        assert_eq!(stream_sid, "MZ1");
        assert_eq!(start.call_sid.as_deref(), Some("CA1"));
        assert_eq!(start.media_format.unwrap().sample_rate, 8000);
    }

    #[test]
    fn test_parse_media_and_decode() {
        let event = StreamEvent::parse(
            r#"{"event":"media","streamSid":"MZ1","media":{"track":"inbound","chunk":"2","timestamp":"5","payload":"//79"}}"#,
        )
        .unwrap();
        let StreamEvent::Media { media } = event else {
            panic!("expected media");
        };
        assert_eq!(media.decode().unwrap().as_ref(), &[0xff, 0xfe, 0xfd]);
    }

    #[test]
    fn test_parse_stop_and_unknown() {
        assert_eq!(
            StreamEvent::parse(r#"{"event":"stop","streamSid":"MZ1","stop":{"callSid":"CA1"}}"#)
                .unwrap(),
            StreamEvent::Stop
        );
        assert_eq!(
            StreamEvent::parse(r#"{"event":"something-new"}"#).unwrap(),
            StreamEvent::Unknown
        );
        assert!(StreamEvent::parse("not json").is_err());
    }

    #[test]
    fn test_outbound_media_json() {
        let json: serde_json::Value =
            serde_json::from_str(&OutboundMessage::media("MZ1", &[0xff, 0xfe, 0xfd]).to_json())
                .unwrap();
        assert_eq!(json["event"], "media");
        assert_eq!(json["streamSid"], "MZ1");
        assert_eq!(json["media"]["payload"], "//79");
        assert!(json["media"].get("track").is_none());
    }

    #[test]
    fn test_outbound_mark_json() {
        let json: serde_json::Value =
            serde_json::from_str(&OutboundMessage::mark("MZ1", "reply-1").to_json()).unwrap();
        assert_eq!(json["event"], "mark");
        assert_eq!(json["mark"]["name"], "reply-1");
    }
}
