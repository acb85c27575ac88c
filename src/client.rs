//! Client side of `POST /outbound_call`, used by the `call` subcommand.

use anyhow::{Context, anyhow};
use serde_json::Value;

/// Ask a running gateway at `server` to dial `to_phone`.
pub async fn request_outbound_call(server: &str, to_phone: &str) -> anyhow::Result<Value> {
    let url = format!("{}/outbound_call", server.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .form(&[("to_phone", to_phone)])
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("Gateway returned a non-JSON response")?;
    if !status.is_success() {
        return Err(anyhow!(
            "Gateway refused the call ({status}): {}",
            body.get("error").and_then(Value::as_str).unwrap_or("unknown error")
        ));
    }
    Ok(body)
}
