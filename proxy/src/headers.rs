// Header helpers shared by the request and response paths: hop-by-hop stripping
// in both directions, and the CORS headers browsers need to call the proxy.

use http::Version;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONNECTION, HeaderMap, HeaderName, HeaderValue, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE,
    TRAILER, TRANSFER_ENCODING, UPGRADE,
};

static HOP_BY_HOP_NAMES: &[HeaderName] = &[
    CONNECTION,
    TRANSFER_ENCODING,
    TE,
    TRAILER,
    UPGRADE,
    PROXY_AUTHORIZATION,
    PROXY_AUTHENTICATE,
];

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

fn is_http1(v: Version) -> bool {
    matches!(v, Version::HTTP_09 | Version::HTTP_10 | Version::HTTP_11)
}

/// Removes hop-by-hop headers before a message is forwarded.
///
/// Covers the standard hop-by-hop set, anything named in `Connection`, and
/// `Keep-Alive` on HTTP/0.9 and HTTP/1.0. HTTP/2 and later carry none of
/// these, so their headers are left alone.
pub fn filter_hop_by_hop(headers: &mut HeaderMap, version: Version) {
    if !is_http1(version) {
        return;
    }

    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| HeaderName::from_bytes(t.as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP_NAMES.iter().chain(listed.iter()) {
        headers.remove(name);
    }

    if matches!(version, Version::HTTP_09 | Version::HTTP_10) {
        headers.remove(HeaderName::from_static("keep-alive"));
    }
}

/// Headers answering a CORS preflight: any origin, the proxied methods, any
/// request header.
pub fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers
}

/// Sets `Access-Control-Allow-Origin: *`, replacing any value already present.
pub fn allow_any_origin(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}
