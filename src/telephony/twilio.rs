//! Twilio REST client for placing and ending calls.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{TelephonyError, TelephonyResult};

pub const TWILIO_API_URL: &str = "https://api.twilio.com";

/// Account credentials for the Twilio REST API.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
}

impl TwilioConfig {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    pub fn validate(&self) -> TelephonyResult<()> {
        if self.account_sid.trim().is_empty() {
            return Err(TelephonyError::InvalidConfiguration(
                "Twilio account SID must not be empty".into(),
            ));
        }
        if self.auth_token.trim().is_empty() {
            return Err(TelephonyError::InvalidConfiguration(
                "Twilio auth token must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// Form posted by Twilio to an inbound call webhook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwilioCallRequest {
    pub call_sid: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub call_status: Option<String>,
}

/// Subset of the call resource Twilio returns.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioCall {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    config: TwilioConfig,
    api_base: String,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> TelephonyResult<Self> {
        config.validate()?;
        Ok(Self {
            http: reqwest::Client::new(),
            config,
            api_base: TWILIO_API_URL.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.config.account_sid
        )
    }

    fn call_url(&self, call_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls/{}.json",
            self.api_base, self.config.account_sid, call_sid
        )
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> TelephonyResult<TwilioCall> {
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&body)
                .map(|b| b.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(TelephonyError::Twilio {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<TwilioCall>()
            .await
            .map_err(|e| TelephonyError::Protocol(format!("unexpected Twilio response: {e}")))
    }

    /// Place a call that runs `twiml` once answered. Returns the call SID.
    pub async fn create_call(&self, to: &str, from: &str, twiml: &str) -> TelephonyResult<String> {
        debug!(to, from, "Creating Twilio call");
        let call = self
            .post_form(&self.calls_url(), &[("To", to), ("From", from), ("Twiml", twiml)])
            .await?;
        info!(call_sid = %call.sid, status = ?call.status, "Twilio call created");
        Ok(call.sid)
    }

    /// Hang up a call in progress.
    pub async fn end_call(&self, call_sid: &str) -> TelephonyResult<()> {
        let call = self
            .post_form(&self.call_url(call_sid), &[("Status", "completed")])
            .await?;
        info!(call_sid = %call.sid, "Twilio call completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TwilioClient {
        TwilioClient::new(TwilioConfig::new("AC123", "secret"))
            .unwrap()
            .with_api_base(server.uri())
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        assert!(TwilioConfig::new("", "token").validate().is_err());
        assert!(TwilioConfig::new("AC1", " ").validate().is_err());
        assert!(TwilioConfig::new("AC1", "token").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", TwilioConfig::new("AC1", "hunter2"));
        assert!(debug.contains("AC1"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_create_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=%2B573001112233"))
            .and(body_string_contains("Twiml="))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"sid": "CA999", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sid = client(&server)
            .create_call("+573001112233", "+15202239830", "<Response/>")
            .await
            .unwrap();
        assert_eq!(sid, "CA999");
    }

    #[tokio::test]
    async fn test_create_call_surfaces_twilio_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"code": 21211, "message": "Invalid 'To' Phone Number"}),
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_call("+1", "+15202239830", "<Response/>")
            .await
            .unwrap_err();
        match err {
            TelephonyError::Twilio { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid 'To' Phone Number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_end_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Calls/CA999.json"))
            .and(body_string_contains("Status=completed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"sid": "CA999", "status": "completed"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server).end_call("CA999").await.unwrap();
    }
}
