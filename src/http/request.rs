//! Outbound request construction.
//!
//! # Responsibilities
//! - Buffer the inbound body for methods that carry one, leaving the
//!   inbound request readable afterwards
//! - Compute the target URI from the matched route
//! - Copy headers, set `Host`, re-add `Origin`, attach content
//!
//! # Design Decisions
//! - Target URI is plain concatenation: base + stripped path + raw query
//! - The HTTP method is forwarded exactly as received
//! - `Content-Type` travels with the body, never on its own

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Method, Request},
};
use http_body_util::LengthLimitError;
use url::Url;

use crate::error::GatewayError;
use crate::http::headers::is_request_excluded;
use crate::routing::matcher::strip_prefix;
use crate::routing::RouteEntry;

/// Copy of the inbound body kept in request extensions once buffered.
#[derive(Debug, Clone)]
pub struct BufferedBody(pub Bytes);

/// A fully prepared downstream request.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ForwardRequest {
    pub fn into_reqwest(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let builder = client.request(self.method, self.url).headers(self.headers);
        match self.body {
            Some(body) => builder.body(body),
            None => builder,
        }
    }
}

/// Methods whose body is forwarded.
pub fn carries_body(method: &Method) -> bool {
    let method = method.as_str().to_ascii_uppercase();
    matches!(method.as_str(), "POST" | "PUT" | "PATCH")
}

/// Read the whole inbound body into memory.
///
/// The request keeps a replayable copy of the same bytes as its body and
/// as a [`BufferedBody`] extension.
pub async fn buffer_body(request: &mut Request<Body>, limit: usize) -> Result<Bytes, GatewayError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(GatewayError::PayloadTooLarge { limit });
    }

    let body = std::mem::take(request.body_mut());
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            GatewayError::PayloadTooLarge { limit }
        } else {
            GatewayError::Internal(format!("Failed to read request body: {inner}"))
        }
    })?;

    *request.body_mut() = Body::from(bytes.clone());
    request.extensions_mut().insert(BufferedBody(bytes.clone()));
    Ok(bytes)
}

/// Compute `base + stripped path + query` for a matched route.
pub fn target_uri<B>(route: &RouteEntry, request: &Request<B>) -> String {
    let stripped = strip_prefix(request.uri().path(), route.path_prefix());
    let query = request
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    format!("{}{}{}", route.target_base_uri(), stripped, query)
}

/// Build the downstream request for `route` from the inbound request.
pub fn build_forward_request<B>(
    route: &RouteEntry,
    request: &Request<B>,
    body: Option<Bytes>,
) -> Result<ForwardRequest, GatewayError> {
    let target = target_uri(route, request);
    let url = Url::parse(&target)
        .map_err(|e| GatewayError::Internal(format!("Invalid URI '{target}': {e}")))?;

    let inbound = request.headers();
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if is_request_excluded(name) || name == header::CONTENT_TYPE {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(header::HOST, host_header(&url)?);

    if let Some(origin) = inbound.get(header::ORIGIN) {
        headers.remove(header::ORIGIN);
        headers.insert(header::ORIGIN, origin.clone());
    }

    if body.is_some() {
        if let Some(content_type) = inbound.get(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, content_type.clone());
        }
    }

    Ok(ForwardRequest {
        method: request.method().clone(),
        url,
        headers,
        body,
    })
}

fn host_header(url: &Url) -> Result<HeaderValue, GatewayError> {
    let host = url
        .host_str()
        .ok_or_else(|| GatewayError::Internal(format!("URI '{url}' has no host")))?;
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value)
        .map_err(|e| GatewayError::Internal(format!("Invalid host '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    #[test]
    fn test_target_uri_default_route() {
        let route = RouteEntry::new("/users", "http://svc-a");
        let req = request("GET", "/users/5?x=1").body(Body::empty()).unwrap();
        let fwd = build_forward_request(&route, &req, None).unwrap();
        assert_eq!(fwd.url.as_str(), "http://svc-a/5?x=1");
    }

    #[test]
    fn test_target_uri_keeps_path_case() {
        let route = RouteEntry::new("/users", "http://svc-b");
        let req = request("GET", "/USERS/AbC").body(Body::empty()).unwrap();
        assert_eq!(target_uri(&route, &req), "http://svc-b/AbC");
    }

    #[test]
    fn test_target_uri_from_encoded_path() {
        let route = RouteEntry::new("/my files", "http://svc-a");
        let req = request("GET", "/my%20files/x%20y?q=1").body(Body::empty()).unwrap();
        let fwd = build_forward_request(&route, &req, None).unwrap();
        assert_eq!(fwd.url.as_str(), "http://svc-a/x%20y?q=1");
    }

    #[test]
    fn test_target_uri_with_base_path() {
        let route = RouteEntry::new("/orders", "https://svc-c:8443/api/v2");
        let req = request("GET", "/orders/7/lines?page=2&size=10")
            .body(Body::empty())
            .unwrap();
        let fwd = build_forward_request(&route, &req, None).unwrap();
        assert_eq!(fwd.url.as_str(), "https://svc-c:8443/api/v2/7/lines?page=2&size=10");
        assert_eq!(fwd.headers[header::HOST], "svc-c:8443");
    }

    #[test]
    fn test_invalid_target_is_internal() {
        let route = RouteEntry::new("/users", "not a uri");
        let req = request("GET", "/users/5").body(Body::empty()).unwrap();
        let err = build_forward_request(&route, &req, None).unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }

    #[test]
    fn test_header_copy() {
        let route = RouteEntry::new("/users", "http://svc-a");
        let req = request("GET", "/users/5")
            .header("host", "gateway.example.com")
            .header("content-length", "0")
            .header("transfer-encoding", "chunked")
            .header("content-type", "application/json")
            .header("x-trace", "1")
            .header("x-trace", "2")
            .header("origin", "https://app.example.com")
            .header("api-auth-key", "encrypted")
            .body(Body::empty())
            .unwrap();
        let fwd = build_forward_request(&route, &req, None).unwrap();

        assert_eq!(fwd.headers[header::HOST], "svc-a");
        assert!(fwd.headers.get(header::CONTENT_LENGTH).is_none());
        assert!(fwd.headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(fwd.headers.get(header::CONTENT_TYPE).is_none());
        assert_eq!(fwd.headers.get_all("x-trace").iter().count(), 2);
        assert_eq!(fwd.headers[header::ORIGIN], "https://app.example.com");
        assert_eq!(fwd.headers["api-auth-key"], "encrypted");
        assert!(fwd.body.is_none());
    }

    #[test]
    fn test_content_type_travels_with_body() {
        let route = RouteEntry::new("/users", "http://svc-a");
        let req = request("POST", "/users")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap();
        let fwd = build_forward_request(&route, &req, Some(Bytes::from_static(b"{}"))).unwrap();
        assert_eq!(fwd.method, Method::POST);
        assert_eq!(fwd.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(fwd.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_carries_body() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));
        assert!(carries_body(&Method::from_bytes(b"patch").unwrap()));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::DELETE));
        assert!(!carries_body(&Method::HEAD));
    }

    #[tokio::test]
    async fn test_buffer_body_is_replayable() {
        let mut req = request("POST", "/users")
            .body(Body::from("payload-bytes"))
            .unwrap();
        let bytes = buffer_body(&mut req, 1024).await.unwrap();
        assert_eq!(&bytes[..], b"payload-bytes");
        assert_eq!(&req.extensions().get::<BufferedBody>().unwrap().0[..], b"payload-bytes");

        let replay = axum::body::to_bytes(req.into_body(), 1024).await.unwrap();
        assert_eq!(replay, bytes);
    }

    #[tokio::test]
    async fn test_buffer_body_limit() {
        let mut req = request("POST", "/users")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        let err = buffer_body(&mut req, 16).await.unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { limit: 16 }));

        let mut req = request("POST", "/users")
            .header("content-length", "4096")
            .body(Body::from("small"))
            .unwrap();
        let err = buffer_body(&mut req, 16).await.unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { .. }));
    }
}
