//! Twilio Guard - Request guard for Twilio webhook endpoints.
//!
//! This library wraps axum handlers so that:
//! - Only the configured HTTP method (GET or POST) is accepted
//! - Requests are verified against Twilio's signature (outside debug mode)
//! - Blacklisted callers are rejected before the handler runs
//! - Handlers can return TwiML or raw XML instead of building responses
//!
//! ## Request Flow
//!
//! ```text
//! Request → method → signature → blacklist → handler → TwiML response
//! ```

pub mod blacklist;
pub mod config;
pub mod error;
pub mod twiml;
pub mod web;

// Re-export commonly used types
pub use blacklist::{BlacklistStore, Caller, MemoryBlacklist, SqliteBlacklist};
pub use config::Config;
pub use error::GuardError;
pub use twiml::{TwimlResponse, Verb};
pub use web::{AppState, TwilioReply, TwilioRequest, TwilioView};
