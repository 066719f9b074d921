//! Forwarding to AnkiConnect.
//!
//! # Responsibilities
//! - Send a request to the configured AnkiConnect URL
//! - Copy every request header upstream and every response header back
//! - Address the upstream by its own authority in `Host`
//! - Relay status and body unchanged
//!
//! # Design Decisions
//! - Bodies are buffered on the way in (the router must inspect them) and
//!   streamed on the way out
//! - An upstream error status is relayed verbatim, not translated
//! - Only an unreachable or silent upstream produces a bridge-generated error

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header::HOST, HeaderMap, HeaderValue, Method, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;
use crate::error::{BridgeError, BridgeResult};

/// Copy headers between request/response representations.
///
/// Nothing is excluded; multi-valued headers keep every value in order.
pub fn propagate_headers(source: &HeaderMap) -> HeaderMap {
    let mut target = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        target.append(name.clone(), value.clone());
    }
    target
}

/// HTTP client bound to one AnkiConnect endpoint.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    uri: Uri,
    host: HeaderValue,
    timeout: Duration,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig) -> BridgeResult<Self> {
        let uri: Uri = config
            .url
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| BridgeError::InvalidUpstreamUrl {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;

        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(BridgeError::InvalidUpstreamUrl {
                url: config.url.clone(),
                reason: "expected an absolute http:// URL".to_string(),
            });
        }

        let host = uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
            .ok_or_else(|| BridgeError::InvalidUpstreamUrl {
                url: config.url.clone(),
                reason: "expected an absolute http:// URL".to_string(),
            })?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            uri,
            host,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// `ForwardHTTP(method, body, headers) -> (status, headers, body)`.
    pub async fn forward(
        &self,
        method: Method,
        headers: &HeaderMap,
        body: Bytes,
    ) -> BridgeResult<Response<Body>> {
        let mut request = Request::builder()
            .method(method.clone())
            .uri(self.uri.clone())
            .body(Body::from(body))?;
        *request.headers_mut() = propagate_headers(headers);
        // The caller addressed the bridge; AnkiConnect must see its own name.
        request.headers_mut().insert(HOST, self.host.clone());

        tracing::debug!(method = %method, uri = %self.uri, "Forwarding to AnkiConnect");

        let response = match tokio::time::timeout(self.timeout, self.client.request(request)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(BridgeError::UpstreamTimeout(self.timeout)),
        };

        let (parts, body) = response.into_parts();
        let mut relayed = Response::new(Body::new(body));
        *relayed.status_mut() = parts.status;
        *relayed.version_mut() = parts.version;
        *relayed.headers_mut() = propagate_headers(&parts.headers);

        tracing::debug!(status = %parts.status, "AnkiConnect responded");
        Ok(relayed)
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("uri", &self.uri)
            .field("timeout", &self.timeout)
            .finish()
    }
}
