//! Request guard for Twilio webhook handlers.
//!
//! A [`TwilioView`] wraps a handler and turns it into an axum route. Every
//! request goes through these checks, in order, before the handler runs:
//!
//! 1. HTTP method (405 on mismatch)
//! 2. Request signature, only for POST and only outside debug mode (403)
//! 3. Caller blacklist, when enabled (TwiML `<Reject/>`)
//!
//! The handler's reply is then coerced into a response, see [`TwilioReply`].
//! Guarded routes never look at cookies or sessions, so they need no CSRF
//! exemption: Twilio's servers are the only expected callers.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, RawPathParams},
    http::{
        header, request::Parts, Extensions, HeaderMap, HeaderValue, Method, Request, StatusCode,
        Uri,
    },
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
};
use tracing::{debug, info, warn};

use crate::blacklist::BlacklistStore;
use crate::error::{GuardError, Result};
use crate::twiml::TwimlResponse;
use crate::web::reply::TwilioReply;
use crate::web::signature::{RequestValidator, SIGNATURE_HEADER};
use crate::web::AppState;
use crate::Config;

/// Largest webhook body the guard will buffer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Parameter carrying the caller's phone number.
pub const CALLER_PARAM: &str = "From";

/// An inbound webhook as seen by a guarded handler.
#[derive(Debug, Clone)]
pub struct TwilioRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Request extensions, including `OriginalUri` under nested routers
    pub extensions: Extensions,
    /// Captures from the matched route, e.g. `sid` for `/calls/:sid`
    pub path_params: Vec<(String, String)>,
    /// Form-encoded POST body parameters, in arrival order
    pub form: Vec<(String, String)>,
    /// Query string parameters, in arrival order
    pub query: Vec<(String, String)>,
}

impl TwilioRequest {
    /// Look up a parameter, POST body first, then query string.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .chain(self.query.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up a capture from the matched route.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The caller's phone number, if the request carries one.
    pub fn caller(&self) -> Option<&str> {
        self.param(CALLER_PARAM).filter(|from| !from.is_empty())
    }
}

/// Guard configuration plus the collaborators it needs.
#[derive(Clone)]
pub struct TwilioView {
    method: Method,
    blacklist: bool,
    config: Arc<Config>,
    store: Arc<dyn BlacklistStore>,
    validator: RequestValidator,
}

impl TwilioView {
    /// A guard accepting POST with the blacklist enforced.
    pub fn new(state: &AppState) -> Self {
        Self {
            method: Method::POST,
            blacklist: true,
            config: state.config.clone(),
            store: state.blacklist.clone(),
            validator: RequestValidator::new(state.config.auth_token.clone()),
        }
    }

    /// Restrict the view to `method`, which must be GET or POST (any case).
    pub fn method(mut self, method: &str) -> Result<Self> {
        self.method = match method.to_ascii_uppercase().as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            _ => return Err(GuardError::InvalidMethod(method.to_string())),
        };
        Ok(self)
    }

    /// Enable or disable the caller blacklist check.
    pub fn blacklist(mut self, enforce: bool) -> Self {
        self.blacklist = enforce;
        self
    }

    /// Wrap `handler` into a route that runs every guard check first.
    pub fn wrap<F, Fut, R, S>(self, handler: F) -> MethodRouter<S>
    where
        F: Fn(TwilioRequest) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Into<TwilioReply> + Send,
        S: Clone + Send + Sync + 'static,
    {
        let view = Arc::new(self);
        any(move |params: Option<RawPathParams>, req: Request<Body>| {
            let view = view.clone();
            let handler = handler.clone();
            let path_params: Vec<(String, String)> = params
                .map(|p| {
                    p.iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .unwrap_or_default();
            async move { view.dispatch(req, path_params, handler).await }
        })
    }

    async fn dispatch<F, Fut, R>(
        &self,
        req: Request<Body>,
        path_params: Vec<(String, String)>,
        handler: F,
    ) -> Response
    where
        F: Fn(TwilioRequest) -> Fut,
        Fut: Future<Output = R>,
        R: Into<TwilioReply>,
    {
        if req.method() != self.method {
            warn!(
                method = %req.method(),
                allowed = %self.method,
                path = %req.uri().path(),
                "twilio_method_not_allowed"
            );
            return method_not_allowed(&self.method);
        }

        let (parts, body) = req.into_parts();
        let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, path = %parts.uri.path(), "twilio_body_unreadable");
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
        };

        let form = if parts.method == Method::POST && is_form_encoded(&parts.headers) {
            parse_pairs(&bytes)
        } else {
            Vec::new()
        };
        let query = parts
            .uri
            .query()
            .map(|q| parse_pairs(q.as_bytes()))
            .unwrap_or_default();

        if !self.config.debug && parts.method == Method::POST {
            if let Err(reason) = self.verify_signature(&parts, &form) {
                warn!(reason = reason, path = %parts.uri.path(), "twilio_request_forbidden");
                return StatusCode::FORBIDDEN.into_response();
            }
        }

        let request = TwilioRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            extensions: parts.extensions,
            path_params,
            form,
            query,
        };

        if self.blacklist {
            if let Some(response) = self.check_blacklist(&request).await {
                return response;
            }
        }

        debug!(path = %request.uri.path(), "twilio_handler_invoked");
        let reply: TwilioReply = handler(request).await.into();
        reply.into_response()
    }

    fn verify_signature(
        &self,
        parts: &Parts,
        form: &[(String, String)],
    ) -> std::result::Result<(), &'static str> {
        if !self.config.has_auth_token() {
            return Err("auth_token_not_configured");
        }

        let signature = parts
            .headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or("signature_missing")?;

        let url = request_url(parts, self.config.public_base_url.as_deref())
            .ok_or("url_unavailable")?;

        if self.validator.validate(&url, form, signature) {
            Ok(())
        } else {
            Err("signature_invalid")
        }
    }

    /// `Some(response)` when the caller is blacklisted.
    async fn check_blacklist(&self, request: &TwilioRequest) -> Option<Response> {
        let caller = request.caller()?;

        match self.store.is_blacklisted(caller).await {
            Ok(true) => {
                info!(caller = %caller, "twilio_caller_blacklisted");
                Some(blacklisted_response())
            }
            Ok(false) => None,
            Err(e) => {
                warn!(caller = %caller, error = %e, "twilio_blacklist_lookup_failed");
                None
            }
        }
    }
}

/// The TwiML sent back to a blacklisted caller.
pub fn blacklisted_response() -> Response {
    TwilioReply::from(TwimlResponse::new().reject()).into_response()
}

fn method_not_allowed(allowed: &Method) -> Response {
    let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
    if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// Only form-encoded bodies carry POST parameters.
fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn parse_pairs(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input).into_owned().collect()
}

/// Rebuild the absolute URL Twilio requested.
///
/// The path and query come from `OriginalUri` when present, so routes
/// mounted with `Router::nest` keep their prefix. With a configured public
/// base URL, that base is joined with the path and query. Otherwise the
/// scheme comes from `X-Forwarded-Proto` (default `http`) and the host from
/// the `Host` header or URI authority.
fn request_url(parts: &Parts, public_base_url: Option<&str>) -> Option<String> {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    if let Some(base) = public_base_url {
        return Some(format!("{}{}", base.trim_end_matches('/'), path_and_query));
    }

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))?;

    let scheme = parts
        .headers
        .get("X-Forwarded-Proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");

    Some(format!("{}://{}{}", scheme, host, path_and_query))
}
