use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::state::AppState;

/// Landing page
///
/// Shows the values the gateway runs with, exactly as configured, and a form
/// to place an outbound call.
pub async fn landing_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let config = &state.config;
    let base_url = config.base_url.as_deref().unwrap_or(&state.base_url);
    let caller = config
        .outbound_caller_number
        .as_deref()
        .unwrap_or(&config.profiles.outbound.from_phone);

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Call bot gateway</title></head>
<body>
<h1>Call bot gateway</h1>
<ul>
<li>BASE_URL: {base_url}</li>
<li>OPENAI_API_KEY: {openai}</li>
<li>DEEPGRAM_API_KEY: {deepgram}</li>
<li>AZURE_SPEECH_KEY: {azure}</li>
<li>OUTBOUND_CALLER_NUMBER: {caller}</li>
</ul>
<form method="post" action="/outbound_call">
<label>Phone number <input type="tel" name="to_phone" placeholder="+573001112233"></label>
<button type="submit">Call</button>
</form>
</body>
</html>
"#,
        openai = config.openai_api_key.as_deref().unwrap_or_default(),
        deepgram = config.deepgram_api_key.as_deref().unwrap_or_default(),
        azure = config.azure_speech_key.as_deref().unwrap_or_default(),
    ))
}
