use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};
use crate::handlers::{api, calls};
use crate::state::AppState;
use crate::telephony::OUTBOUND_CALL_ROUTE;

/// Create the router for the gateway's own endpoints
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::landing_page))
        .route(OUTBOUND_CALL_ROUTE, post(calls::outbound_call))
        .layer(TraceLayer::new_for_http())
}

/// Full application: gateway endpoints plus the telephony webhooks and
/// media stream.
///
/// Fails when the inbound profiles declare invalid or clashing routes.
pub fn create_app_router(state: Arc<AppState>) -> AppResult<Router> {
    let telephony = state.telephony_server()?;
    Ok(create_api_router()
        .with_state(state)
        .merge(telephony.router().layer(TraceLayer::new_for_http())))
}

/// Wrap `app` with the per-client rate limit and security headers.
///
/// `rate_limit_requests_per_second` replenishes one request every
/// `1s / rps`, with `rate_limit_burst_size` allowed back to back.
pub fn with_server_layers(app: Router, config: &ServerConfig) -> AppResult<Router> {
    let governor_layer = if config.rate_limiting_enabled() {
        let period = Duration::from_secs(1) / config.rate_limit_requests_per_second;
        let governor_config = GovernorConfigBuilder::default()
            .period(period)
            .burst_size(config.rate_limit_burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| AppError::InternalError("Failed to build rate limiter config".into()))?;
        Some(GovernorLayer::new(governor_config))
    } else {
        info!("Rate limiting disabled");
        None
    };

    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    Ok(app
        .layer(tower::util::option_layer(governor_layer))
        .layer(security_headers))
}
