//! Response construction.
//!
//! # Responsibilities
//! - Turn a redirect decision into a `302 Found`
//! - Keep redirects out of shared caches (the target depends on a request
//!   header)

use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, LOCATION},
        HeaderValue, StatusCode,
    },
    response::Response,
};

use crate::routing::RedirectDecision;

/// Build the redirect response for a decision.
///
/// Returns `None` when the target URL cannot be sent as a `Location` header.
pub fn redirect_response(decision: &RedirectDecision) -> Option<Response> {
    let location = HeaderValue::from_str(&decision.target_url).ok()?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(LOCATION, location);
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Some(response)
}
