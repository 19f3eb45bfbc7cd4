//! Locale Redirect Middleware.
//! Sends root requests to the store matching the client's Accept-Language.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::{RequestContext, RequestIdExt};
use crate::http::response::redirect_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::resolve_store_code;

/// Store the request resolved to, attached for downstream handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedStore(pub String);

pub async fn locale_redirect_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = state.snapshot();

    // 1. Resolve the store the request targets without redirection.
    let ctx = RequestContext::from_request(&req, &snapshot.config.run_code);
    let resolved = resolve_store_code(
        ctx.target(),
        ctx.run_code(),
        snapshot.rule.stores(),
        &snapshot.config.routing,
    );

    // 2. Ask the rule; a decision ends the request here.
    match snapshot.rule.evaluate(resolved.as_deref(), &ctx) {
        Some(decision) => match redirect_response(&decision) {
            Some(response) => {
                tracing::info!(
                    request_id = %req.request_id(),
                    store = %decision.store_code,
                    location = %decision.target_url,
                    "Redirecting by Accept-Language"
                );
                metrics::record_evaluation("redirect");
                metrics::record_redirect(&decision.store_code);
                return response;
            }
            None => {
                tracing::warn!(
                    request_id = %req.request_id(),
                    store = %decision.store_code,
                    location = %decision.target_url,
                    "Base URL is not a valid Location header, skipping redirect"
                );
                metrics::record_evaluation("pass");
            }
        },
        None => metrics::record_evaluation("pass"),
    }

    // 3. Pass through, remembering the resolved store.
    if let Some(code) = resolved {
        req.extensions_mut().insert(ResolvedStore(code));
    }
    next.run(req).await
}
