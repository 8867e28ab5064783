//! Application state, router and the bundled webhook endpoints.
//!
//! `/sms` and `/voice` answer Twilio with TwiML through guarded handlers.
//! `/health` is unguarded.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::blacklist::BlacklistStore;
use crate::error::Result;
use crate::twiml::TwimlResponse;
use crate::web::guard::{TwilioRequest, TwilioView};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub blacklist: Arc<dyn BlacklistStore>,
}

impl AppState {
    pub fn new(config: Config, blacklist: Arc<dyn BlacklistStore>) -> Self {
        Self {
            config: Arc::new(config),
            blacklist,
        }
    }
}

/// Build the application router.
pub fn create_router(state: &AppState) -> Result<Router> {
    let sms = TwilioView::new(state).method("POST")?;
    let voice = TwilioView::new(state).method("GET")?;

    Ok(Router::new()
        .route("/health", get(health))
        .route("/sms", sms.wrap(sms_reply))
        .route("/voice", voice.wrap(voice_reply))
        .layer(TraceLayer::new_for_http()))
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Twilio Webhooks
// =============================================================================

/// Incoming SMS: acknowledge the message.
pub async fn sms_reply(req: TwilioRequest) -> TwimlResponse {
    info!(
        caller = req.caller().unwrap_or_default(),
        body_length = req.param("Body").map(str::len).unwrap_or(0),
        "twilio_sms_received"
    );

    TwimlResponse::new().message("Thanks for the message!")
}

/// Incoming call: greet the caller and hang up.
pub async fn voice_reply(req: TwilioRequest) -> TwimlResponse {
    info!(
        caller = req.caller().unwrap_or_default(),
        call_sid = req.param("CallSid").unwrap_or_default(),
        "twilio_call_received"
    );

    TwimlResponse::new().say("Thanks for calling!").hangup()
}
