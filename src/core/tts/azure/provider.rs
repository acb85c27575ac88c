//! Azure Speech REST synthesis.
//!
//! - Endpoint: `POST https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Auth: `Ocp-Apim-Subscription-Key`
//! - Body: SSML selecting the configured voice
//! - Output: raw audio selected through `X-Microsoft-OutputFormat`

use async_trait::async_trait;
use tracing::debug;

use super::config::AzureSynthesizerConfig;
use crate::core::tts::base::{
    AudioData, Synthesizer, TTSError, TTSResult, error_from_response,
};
use crate::utils::xml_escape;

/// Endpoint template; `{region}` is substituted at construction.
pub const AZURE_TTS_URL: &str = "https://{region}.tts.speech.microsoft.com/cognitiveservices/v1";

/// Region used when none is configured.
pub const DEFAULT_AZURE_REGION: &str = "eastus";

const USER_AGENT: &str = "callbot-gateway";

pub struct AzureSynthesizer {
    client: reqwest::Client,
    config: AzureSynthesizerConfig,
    subscription_key: String,
    endpoint: String,
}

impl AzureSynthesizer {
    pub fn new(
        config: AzureSynthesizerConfig,
        subscription_key: impl Into<String>,
        region: &str,
    ) -> TTSResult<Self> {
        let subscription_key = subscription_key.into();
        if subscription_key.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Azure Speech subscription key is required".into(),
            ));
        }
        config.validate()?;
        let region = if region.trim().is_empty() {
            DEFAULT_AZURE_REGION
        } else {
            region.trim()
        };
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            subscription_key,
            endpoint: AZURE_TTS_URL.replace("{region}", region),
        })
    }

    /// Override the synthesis endpoint (tests, sovereign clouds).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// SSML document for one utterance.
    pub fn build_ssml(&self, text: &str) -> String {
        format!(
            "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'>\
             <voice name='{}'>{}</voice></speak>",
            xml_escape(&self.config.language_code),
            xml_escape(&self.config.voice_name),
            xml_escape(text)
        )
    }
}

#[async_trait]
impl Synthesizer for AzureSynthesizer {
    async fn synthesize(&self, text: &str) -> TTSResult<AudioData> {
        let output_format = self.config.output_format()?;
        debug!(
            voice = %self.config.voice_name,
            chars = text.len(),
            "Azure synthesis request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", output_format)
            .header("User-Agent", USER_AGENT)
            .body(self.build_ssml(text))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(AudioData {
            data: response.bytes().await?,
            encoding: self.config.audio_encoding,
            sampling_rate: self.config.sampling_rate,
        })
    }

    fn provider_name(&self) -> &'static str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gonzalo() -> AzureSynthesizerConfig {
        AzureSynthesizerConfig::from_telephone_output_device("es-CO-GonzaloNeural", "es-CO")
    }

    #[test]
    fn test_regional_endpoint() {
        let synth = AzureSynthesizer::new(gonzalo(), "key", "westeurope").unwrap();
        assert_eq!(
            synth.endpoint(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );

        let synth = AzureSynthesizer::new(gonzalo(), "key", "").unwrap();
        assert!(synth.endpoint().starts_with("https://eastus."));
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            AzureSynthesizer::new(gonzalo(), "  ", "eastus"),
            Err(TTSError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_ssml_escapes_text() {
        let synth = AzureSynthesizer::new(gonzalo(), "key", "eastus").unwrap();
        let ssml = synth.build_ssml("Hola & <adios>");
        assert!(ssml.contains("<voice name='es-CO-GonzaloNeural'>"));
        assert!(ssml.contains("xml:lang='es-CO'"));
        assert!(ssml.contains("Hola &amp; &lt;adios&gt;"));
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header("Ocp-Apim-Subscription-Key", "secret"))
            .and(header("X-Microsoft-OutputFormat", "raw-8khz-8bit-mono-mulaw"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xffu8; 320]))
            .expect(1)
            .mount(&server)
            .await;

        let synth = AzureSynthesizer::new(gonzalo(), "secret", "eastus")
            .unwrap()
            .with_endpoint(format!("{}/cognitiveservices/v1", server.uri()));
        let audio = synth.synthesize("Hola como estas?").await.unwrap();

        assert_eq!(audio.data.len(), 320);
        assert_eq!(audio.sampling_rate, 8000);
    }

    #[tokio::test]
    async fn test_synthesize_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let synth = AzureSynthesizer::new(gonzalo(), "wrong", "eastus")
            .unwrap()
            .with_endpoint(server.uri());
        let err = synth.synthesize("Hola").await.unwrap_err();

        assert_eq!(
            err,
            TTSError::ProviderError {
                status: 401,
                message: "bad key".to_string()
            }
        );
    }
}
