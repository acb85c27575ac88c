//! TwiML responses that hand a call over to the media-stream WebSocket.

use crate::utils::xml::xml_escape;

/// Path of the media-stream WebSocket route.
pub const CONNECT_CALL_PATH: &str = "/connect_call";

/// `wss://{base_url}/connect_call/{conversation_id}`
pub fn stream_url(base_url: &str, conversation_id: &str) -> String {
    format!("wss://{base_url}{CONNECT_CALL_PATH}/{conversation_id}")
}

#[derive(Debug, Clone, Default)]
pub struct TwimlBuilder {
    elements: Vec<TwimlElement>,
}

#[derive(Debug, Clone)]
enum TwimlElement {
    ConnectStream { url: String },
    Say { text: String },
    Pause { length: u32 },
    Hangup,
}

impl TwimlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge the call audio to a bidirectional media stream.
    pub fn connect_stream(mut self, url: &str) -> Self {
        self.elements.push(TwimlElement::ConnectStream {
            url: xml_escape(url),
        });
        self
    }

    pub fn say(mut self, text: &str) -> Self {
        self.elements.push(TwimlElement::Say {
            text: xml_escape(text),
        });
        self
    }

    pub fn pause(mut self, seconds: u32) -> Self {
        self.elements.push(TwimlElement::Pause { length: seconds });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.elements.push(TwimlElement::Hangup);
        self
    }

    pub fn build(self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n");
        for element in &self.elements {
            match element {
                TwimlElement::ConnectStream { url } => {
                    xml.push_str(&format!(
                        "  <Connect>\n    <Stream url=\"{url}\"/>\n  </Connect>\n"
                    ));
                }
                TwimlElement::Say { text } => xml.push_str(&format!("  <Say>{text}</Say>\n")),
                TwimlElement::Pause { length } => {
                    xml.push_str(&format!("  <Pause length=\"{length}\"/>\n"));
                }
                TwimlElement::Hangup => xml.push_str("  <Hangup/>\n"),
            }
        }
        xml.push_str("</Response>");
        xml
    }

    /// Response that connects the call to the conversation's media stream.
    pub fn connect_call(base_url: &str, conversation_id: &str) -> String {
        TwimlBuilder::new()
            .connect_stream(&stream_url(base_url, conversation_id))
            .build()
    }

    /// Response that apologises and hangs up.
    pub fn error(message: &str) -> String {
        TwimlBuilder::new().say(message).pause(1).hangup().build()
    }
}
