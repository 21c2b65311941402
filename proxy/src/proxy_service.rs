use crate::config::Config;
use crate::credentials::{SecretSource, authenticate};
use crate::dispatcher::Dispatcher;
use crate::errors::ProxyError;
use crate::headers::{allow_any_origin, filter_hop_by_hop, preflight_headers};
use crate::key_pool::KeyPool;
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Limited, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::service::Service as HyperService;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::empty_body;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type ProxyBody = UnsyncBoxBody<Bytes, ProxyError>;

/// Handles every request on the main listener.
#[derive(Clone)]
pub struct ProxyService {
    inner: Arc<Inner>,
}

struct Inner {
    dispatcher: Dispatcher,
    secrets: Arc<dyn SecretSource>,
    max_body_bytes: usize,
}

impl ProxyService {
    pub fn try_new(config: &Config, secrets: Arc<dyn SecretSource>) -> Result<Self, ProxyError> {
        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher: Dispatcher::try_new(config)?,
                secrets,
                max_body_bytes: config.max_body_bytes,
            }),
        })
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<ProxyBody>
    where
        B: hyper::body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if req.method() == Method::OPTIONS {
            return preflight_response();
        }

        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let mut response = match self.forward(req).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    ProxyError::Unauthorized => {
                        tracing::debug!(method = %method, path = %path, "Rejected request")
                    }
                    _ => tracing::error!(method = %method, path = %path, error = %e, "Request failed"),
                }
                e.into_response()
            }
        };

        allow_any_origin(response.headers_mut());
        response
    }

    async fn forward<B>(&self, req: Request<B>) -> Result<Response<ProxyBody>, ProxyError>
    where
        B: hyper::body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let secrets = self.inner.secrets.as_ref();
        authenticate(secrets, req.headers())?;
        let pool = KeyPool::load(secrets)?;

        // Buffered once so every attempt resends the full body.
        let (parts, body) = req.into_parts();
        let body = Limited::new(body, self.inner.max_body_bytes)
            .collect()
            .await
            .map_err(|e| ProxyError::RequestBody(e.to_string()))?
            .to_bytes();

        let upstream_response = self.inner.dispatcher.dispatch(&parts, &body, &pool).await?;
        Ok(relay(upstream_response))
    }
}

fn preflight_response() -> Response<ProxyBody> {
    let mut response = Response::new(empty_body().boxed_unsync());
    *response.status_mut() = StatusCode::NO_CONTENT;
    *response.headers_mut() = preflight_headers();
    response
}

/// Streams the upstream response back with its status and end-to-end headers.
fn relay(upstream: reqwest::Response) -> Response<ProxyBody> {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    filter_hop_by_hop(&mut headers, upstream.version());

    let frames = upstream
        .bytes_stream()
        .map_ok(Frame::data)
        .map_err(ProxyError::from);

    let mut response = Response::new(StreamBody::new(frames).boxed_unsync());
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

impl HyperService<Request<Incoming>> for ProxyService {
    type Response = Response<ProxyBody>;
    type Error = ProxyError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}
