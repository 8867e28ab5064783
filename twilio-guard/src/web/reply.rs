//! Handler replies and their conversion into HTTP responses.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::twiml::TwimlResponse;

/// Content type for TwiML documents.
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// What a guarded handler hands back.
///
/// `Raw` and `Markup` are TwiML and are sent as `application/xml` with
/// status 200. `PassThrough` is an already built response and is returned
/// untouched.
pub enum TwilioReply {
    Raw(String),
    Markup(TwimlResponse),
    PassThrough(Response),
}

impl IntoResponse for TwilioReply {
    fn into_response(self) -> Response {
        match self {
            TwilioReply::Raw(body) => xml_response(body),
            TwilioReply::Markup(twiml) => xml_response(twiml.to_string()),
            TwilioReply::PassThrough(response) => response,
        }
    }
}

fn xml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response()
}

impl From<String> for TwilioReply {
    fn from(body: String) -> Self {
        TwilioReply::Raw(body)
    }
}

impl From<&str> for TwilioReply {
    fn from(body: &str) -> Self {
        TwilioReply::Raw(body.to_string())
    }
}

impl From<TwimlResponse> for TwilioReply {
    fn from(twiml: TwimlResponse) -> Self {
        TwilioReply::Markup(twiml)
    }
}

impl From<Response> for TwilioReply {
    fn from(response: Response) -> Self {
        TwilioReply::PassThrough(response)
    }
}

/// Handler errors become their own response, unchanged.
impl<T, E> From<Result<T, E>> for TwilioReply
where
    T: Into<TwilioReply>,
    E: IntoResponse,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(reply) => reply.into(),
            Err(err) => TwilioReply::PassThrough(err.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_raw_reply_is_xml() {
        let response = TwilioReply::from("<Response/>").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XML_CONTENT_TYPE);
        assert_eq!(body_string(response).await, "<Response/>");
    }

    #[tokio::test]
    async fn test_markup_reply_is_stringified() {
        let twiml = TwimlResponse::new().say("hi");
        let expected = twiml.to_string();
        let response = TwilioReply::from(twiml).into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], XML_CONTENT_TYPE);
        assert_eq!(body_string(response).await, expected);
    }

    #[tokio::test]
    async fn test_passthrough_is_untouched() {
        let original = (StatusCode::ACCEPTED, "plain").into_response();
        let response = TwilioReply::from(original).into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_ne!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            XML_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let result: Result<String, (StatusCode, &str)> = Err((StatusCode::BAD_GATEWAY, "down"));
        let response = TwilioReply::from(result).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_string(response).await, "down");
    }
}
