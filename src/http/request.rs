//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract the redirect-relevant view of a request (target, run code,
//!   headers)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The request context is a read-only snapshot; the original request
//!   continues down the stack untouched

use axum::http::{
    header::{ACCEPT_LANGUAGE, HOST},
    HeaderMap, HeaderValue, Request,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::config::RunCodeConfig;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header telling the upstream which store the request resolved to.
pub const X_STORE_CODE: &str = "x-store-code";

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Access to the request ID set by the request-id layer.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// What the redirect rule sees of a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    target: String,
    run_code: Option<String>,
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(target: impl Into<String>, run_code: Option<String>, headers: HeaderMap) -> Self {
        Self {
            target: target.into(),
            run_code,
            headers,
        }
    }

    /// Build the context for an HTTP request, deriving the run code from
    /// the configured sources.
    pub fn from_request<B>(req: &Request<B>, run_codes: &RunCodeConfig) -> Self {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        let host = req
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| req.uri().host());

        let run_code = run_code_for(req.headers(), host, run_codes);

        Self::new(target, run_code, req.headers().clone())
    }

    /// Raw request target: path plus query string, if any.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn run_code(&self) -> Option<&str> {
        self.run_code.as_deref()
    }

    /// Raw bytes of the `Accept-Language` header, empty when absent.
    pub fn accept_language(&self) -> &[u8] {
        self.headers
            .get(ACCEPT_LANGUAGE)
            .map(|v| v.as_bytes())
            .unwrap_or_default()
    }
}

fn run_code_for(headers: &HeaderMap, host: Option<&str>, config: &RunCodeConfig) -> Option<String> {
    if let Some(code) = config
        .header
        .as_deref()
        .and_then(|name| headers.get(name))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        return Some(code.to_string());
    }

    if let Some(host) = host.map(strip_port) {
        if let Some(code) = config
            .hosts
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(host))
            .map(|(_, code)| code.clone())
        {
            return Some(code);
        }
    }

    config.default.clone()
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
