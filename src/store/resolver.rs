//! Store resolution for incoming requests.
//!
//! # Responsibilities
//! - Pick the store a request resolves to before locale redirection runs
//! - Prefer an explicit store code in the URL, then the run code, then the
//!   configured default

use crate::config::RoutingConfig;
use crate::store::StoreLookup;

/// Resolve the store code for a request target.
///
/// Returns `None` when nothing resolves, which disables locale redirection
/// for the request.
pub fn resolve_store_code<S: StoreLookup>(
    target: &str,
    run_code: Option<&str>,
    stores: &S,
    routing: &RoutingConfig,
) -> Option<String> {
    if routing.use_store_code_in_url {
        let path = target.split('?').next().unwrap_or(target);
        if let Some(segment) = path.trim_start_matches('/').split('/').next() {
            if !segment.is_empty() && stores.store(segment).is_ok() {
                return Some(segment.to_string());
            }
        }
    }

    if let Some(store) = run_code
        .filter(|code| !code.is_empty())
        .and_then(|code| stores.store(code).ok())
    {
        return Some(store.code.clone());
    }

    routing
        .default_store
        .as_deref()
        .and_then(|code| stores.store(code).ok())
        .map(|store| store.code.clone())
}
