//! ngrok agent launched as a child process.
//!
//! The agent publishes its tunnels on a local inspection API; the public URL
//! is read from there once the tunnel is up.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use super::{Tunnel, TunnelError, TunnelResult};

pub const DEFAULT_NGROK_BIN: &str = "ngrok";
pub const DEFAULT_NGROK_API_URL: &str = "http://127.0.0.1:4040";

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct TunnelList {
    #[serde(default)]
    tunnels: Vec<TunnelInfo>,
}

#[derive(Debug, Deserialize)]
struct TunnelInfo {
    public_url: String,
    #[serde(default)]
    proto: String,
}

pub struct NgrokTunnel {
    auth_token: String,
    binary: String,
    api_url: String,
    timeout: Duration,
    child: Option<Child>,
}

impl std::fmt::Debug for NgrokTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NgrokTunnel")
            .field("binary", &self.binary)
            .field("api_url", &self.api_url)
            .field("running", &self.child.is_some())
            .finish_non_exhaustive()
    }
}

impl NgrokTunnel {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            binary: DEFAULT_NGROK_BIN.to_string(),
            api_url: DEFAULT_NGROK_API_URL.to_string(),
            timeout: STARTUP_TIMEOUT,
            child: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Poll the agent API until it lists a tunnel, preferring https.
pub async fn wait_for_public_url(api_url: &str, timeout: Duration) -> TunnelResult<String> {
    let client = reqwest::Client::new();
    let endpoint = format!("{api_url}/api/tunnels");
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        match client.get(&endpoint).send().await {
            Ok(response) if response.status().is_success() => {
                let list: TunnelList = response
                    .json()
                    .await
                    .map_err(|e| TunnelError::Api(e.to_string()))?;
                let best = list
                    .tunnels
                    .iter()
                    .find(|t| t.proto == "https")
                    .or_else(|| list.tunnels.first());
                if let Some(tunnel) = best {
                    return Ok(tunnel.public_url.clone());
                }
                debug!("Tunnel agent is up but has no tunnels yet");
            }
            Ok(response) => debug!(status = %response.status(), "Tunnel agent API not ready"),
            Err(e) => debug!("Tunnel agent API unreachable: {}", e),
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(TunnelError::Timeout(timeout.as_secs()));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[async_trait]
impl Tunnel for NgrokTunnel {
    async fn connect(&mut self, port: u16) -> TunnelResult<String> {
        info!(binary = %self.binary, port, "Starting ngrok agent");
        let child = Command::new(&self.binary)
            .arg("http")
            .arg(port.to_string())
            .arg("--authtoken")
            .arg(&self.auth_token)
            .arg("--log")
            .arg("stdout")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TunnelError::Spawn(format!("{}: {e}", self.binary)))?;
        self.child = Some(child);

        wait_for_public_url(&self.api_url, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_prefers_https_tunnel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tunnels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tunnels": [
                    {"public_url": "http://abc.ngrok.app", "proto": "http"},
                    {"public_url": "https://abc.ngrok.app", "proto": "https"}
                ]
            })))
            .mount(&server)
            .await;

        let url = wait_for_public_url(&server.uri(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(url, "https://abc.ngrok.app");
    }

    #[tokio::test]
    async fn test_times_out_without_tunnels() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"tunnels": []})))
            .mount(&server)
            .await;

        let result = wait_for_public_url(&server.uri(), Duration::from_millis(300)).await;
        assert!(matches!(result, Err(TunnelError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_spawn() {
        let mut tunnel = NgrokTunnel::new("token").with_binary("/nonexistent/ngrok-binary");
        assert!(matches!(
            tunnel.connect(3000).await,
            Err(TunnelError::Spawn(_))
        ));
    }
}
