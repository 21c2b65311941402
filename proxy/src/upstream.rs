use crate::config::UpstreamConfig;
use crate::errors::ProxyError;
use crate::headers::filter_hop_by_hop;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, HOST};
use http::request::Parts;
use http::{HeaderValue, Uri};
use url::Url;

/// The fixed upstream every request is rewritten onto.
#[derive(Clone, Debug)]
pub struct Upstream {
    base: Url,
}

impl TryFrom<&UpstreamConfig> for Upstream {
    type Error = ProxyError;

    fn try_from(config: &UpstreamConfig) -> Result<Self, Self::Error> {
        let base = Url::parse(&format!("{}://{}/", config.scheme.as_str(), config.host))?;

        Ok(Upstream { base })
    }
}

impl Upstream {
    /// The upstream URL for an inbound URI: the configured scheme and host
    /// with the inbound path and query.
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url
    }

    /// Builds a fresh outbound request for one attempt.
    ///
    /// Inbound headers are copied minus hop-by-hop headers, `Content-Length`
    /// and `Host`. The client fills those in from the buffered body and the
    /// target URL, so `Host` names the upstream and follows redirects.
    /// `Authorization` carries the selected key.
    pub fn build_request(
        &self,
        client: &reqwest::Client,
        parts: &Parts,
        body: &Bytes,
        key: &str,
    ) -> Result<reqwest::Request, ProxyError> {
        let mut headers = parts.headers.clone();
        filter_hop_by_hop(&mut headers, parts.version);
        headers.remove(CONTENT_LENGTH);
        headers.remove(HOST);

        let authorization =
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| ProxyError::InvalidKey)?;
        headers.insert(AUTHORIZATION, authorization);

        let request = client
            .request(parts.method.clone(), self.target_url(&parts.uri))
            .headers(headers)
            .body(body.clone())
            .build()?;

        Ok(request)
    }
}
