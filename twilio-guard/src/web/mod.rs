//! Web layer for Twilio webhooks.
//!
//! This module provides:
//! - A request guard that wraps handlers with method, signature and
//!   blacklist checks
//! - Twilio request signature verification
//! - Conversion of handler replies (TwiML or raw XML) into responses

pub mod guard;
pub mod handlers;
pub mod reply;
pub mod signature;

pub use guard::{blacklisted_response, TwilioRequest, TwilioView};
pub use handlers::{create_router, health, sms_reply, voice_reply, AppState, HealthResponse};
pub use reply::{TwilioReply, XML_CONTENT_TYPE};
pub use signature::{RequestValidator, SIGNATURE_HEADER};
