use axum::{Form, Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::AppResult;
use crate::state::AppState;
use crate::telephony::OutboundCall;

#[derive(Debug, Default, Deserialize)]
pub struct OutboundCallForm {
    #[serde(default)]
    pub to_phone: Option<String>,
}

/// Place an outbound call with the outbound profile.
///
/// Returns once Twilio has accepted the call. A missing or blank `to_phone`
/// places no call and still reports success.
pub async fn outbound_call(
    State(state): State<Arc<AppState>>,
    Form(form): Form<OutboundCallForm>,
) -> AppResult<Json<Value>> {
    let to_phone = form.to_phone.as_deref().map(str::trim).unwrap_or_default();
    if to_phone.is_empty() {
        warn!("Outbound call requested without to_phone, nothing to dial");
        return Ok(Json(json!({ "status": "success" })));
    }

    let mut call = OutboundCall::new(
        state.base_url.clone(),
        to_phone,
        &state.config.profiles.outbound,
        state.config.twilio_config(),
        state.config_manager.clone(),
    )?;
    if let Some(ref api_base) = state.config.endpoints.twilio_api_url {
        call = call.with_twilio_api_base(api_base.clone());
    }

    call.start().await?;
    info!(
        conversation_id = %call.conversation_id(),
        call_sid = ?call.twilio_sid(),
        "Outbound call placed"
    );
    Ok(Json(json!({ "status": "success" })))
}
