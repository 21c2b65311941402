use crate::config::ValidationError;
use crate::proxy_service::ProxyBody;
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use shared::http::{make_json_response, make_text_response};
use std::io;

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    #[error("invalid upstream URL: {0}")]
    InvalidUpstream(#[from] url::ParseError),
    #[error("Access Denied: Invalid Password")]
    Unauthorized,
    #[error("API_KEYS not set in environment variables")]
    KeysNotSet,
    #[error("API_KEYS contains no usable keys")]
    EmptyKeyPool,
    #[error("API_KEYS contains a key that is not a valid header value")]
    InvalidKey,
    #[error("failed to read request body: {0}")]
    RequestBody(String),
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

impl ProxyError {
    /// Converts the error into the response returned to the client.
    ///
    /// Upstream transport errors expose the underlying message to the caller.
    pub fn into_response(self) -> Response<ProxyBody> {
        let response = match &self {
            ProxyError::Unauthorized => make_json_response(
                StatusCode::UNAUTHORIZED,
                &serde_json::json!({
                    "error": "Unauthorized",
                    "message": self.to_string(),
                }),
            ),
            ProxyError::KeysNotSet | ProxyError::EmptyKeyPool | ProxyError::InvalidKey => {
                make_text_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {self}"))
            }
            ProxyError::RequestBody(_) => make_json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": self.to_string() }),
            ),
            _ => make_json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({ "error": self.to_string() }),
            ),
        };
        response.map(BodyExt::boxed_unsync)
    }
}
