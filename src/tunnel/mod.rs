//! Public base URL resolution.
//!
//! Twilio must reach the webhooks and the media stream from the internet.
//! A configured `BASE_URL` wins; otherwise a tunnel agent exposes the local
//! port and reports the URL it got.

pub mod ngrok;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use ngrok::{DEFAULT_NGROK_API_URL, NgrokTunnel};

use crate::config::ServerConfig;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("BASE_URL must be set in environment if not using a tunnel (set NGROK_AUTH_TOKEN)")]
    NoBaseUrl,
    #[error("Failed to start tunnel agent: {0}")]
    Spawn(String),
    #[error("Tunnel agent API error: {0}")]
    Api(String),
    #[error("Tunnel agent reported no public URL within {0} seconds")]
    Timeout(u64),
    #[error("Tunnel returned an empty public URL")]
    EmptyUrl,
}

pub type TunnelResult<T> = Result<T, TunnelError>;

/// Something that can expose a local port publicly.
#[async_trait]
pub trait Tunnel: Send {
    /// Open the tunnel and return its public URL, scheme included.
    async fn connect(&mut self, port: u16) -> TunnelResult<String>;
}

/// Drop a leading `https://` or `http://` and any trailing slash.
pub fn strip_scheme(url: &str) -> &str {
    let url = url.trim();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    url.trim_end_matches('/')
}

/// Work out the host the bot is reachable at.
///
/// The tunnel is only touched when no base URL is configured.
pub async fn resolve_base_url(
    configured: Option<&str>,
    tunnel: Option<&mut (dyn Tunnel + '_)>,
    port: u16,
) -> TunnelResult<String> {
    if let Some(base) = configured.map(strip_scheme).filter(|b| !b.is_empty()) {
        info!(base_url = %base, "Using configured base URL");
        return Ok(base.to_string());
    }

    let tunnel = tunnel.ok_or(TunnelError::NoBaseUrl)?;
    let public_url = tunnel.connect(port).await?;
    let base = strip_scheme(&public_url);
    if base.is_empty() {
        return Err(TunnelError::EmptyUrl);
    }
    info!("Tunnel \"{}\" -> \"http://127.0.0.1:{}\"", base, port);
    Ok(base.to_string())
}

/// Resolve the base URL for `config`, starting ngrok when needed.
///
/// The returned tunnel must be kept alive while the server runs; dropping it
/// stops the agent.
pub async fn resolve_for_config(
    config: &ServerConfig,
) -> TunnelResult<(String, Option<NgrokTunnel>)> {
    let configured = config.base_url.as_deref().filter(|b| !b.trim().is_empty());
    let mut tunnel = match (configured, &config.ngrok_auth_token) {
        (None, Some(token)) => Some(
            NgrokTunnel::new(token.clone())
                .with_binary(config.ngrok_bin.clone())
                .with_api_url(config.ngrok_api_url.clone()),
        ),
        _ => None,
    };
    let base_url = resolve_base_url(
        configured,
        tunnel.as_mut().map(|t| t as &mut dyn Tunnel),
        config.port,
    )
    .await?;
    Ok((base_url, tunnel))
}
