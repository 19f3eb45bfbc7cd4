//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the redirect middleware and pass-through handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Apply configuration reloads without dropping traffic
//! - Forward non-redirected requests to the upstream application

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use arc_swap::ArcSwap;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::middleware::{locale_redirect_middleware, ResolvedStore};
use crate::http::request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID, X_STORE_CODE};
use crate::observability::metrics;
use crate::routing::ConfiguredRule;

/// Everything derived from one configuration version.
#[derive(Debug)]
pub struct Snapshot {
    pub config: GatewayConfig,
    pub rule: ConfiguredRule,
}

impl Snapshot {
    pub fn new(config: GatewayConfig) -> Self {
        let rule = ConfiguredRule::from_config(&config);
        Self { config, rule }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Snapshot>>,
    pub client: Client<HttpConnector, Body>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            inner: Arc::new(ArcSwap::from_pointee(Snapshot::new(config))),
            client,
        }
    }

    /// The snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }

    /// Swap in a new configuration. In-flight requests keep the old one.
    pub fn reload(&self, config: GatewayConfig) {
        let snapshot = Snapshot::new(config);
        tracing::info!(
            stores = snapshot.rule.stores().len(),
            "Applied configuration reload"
        );
        self.inner.store(Arc::new(snapshot));
        metrics::record_config_reload("applied");
    }
}

/// HTTP server for the locale redirect gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState::new(config);
        let router = Self::build_router(request_timeout, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_timeout: Duration, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .fallback(forward_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                locale_redirect_middleware,
            ))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Shared state, e.g. for applying reloads from outside the server.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the current one.
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let reload_state = self.state.clone();
        let reloads = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload_state.reload(config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloads.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Pass-through handler.
/// Forwards the request to the upstream application.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let snapshot = state.snapshot();
    let Some(upstream) = snapshot.config.upstream.address.as_deref() else {
        return (StatusCode::NOT_FOUND, "No upstream configured").into_response();
    };

    let request_id = request.request_id().to_string();
    let resolved = request.extensions().get::<ResolvedStore>().cloned();
    let (mut parts, body) = request.into_parts();

    // URI rewrite
    let authority = match Authority::from_str(upstream) {
        Ok(authority) => authority,
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Invalid upstream address");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream address").into_response();
        }
    };
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };

    if let Some(ResolvedStore(code)) = resolved {
        if let Ok(value) = HeaderValue::from_str(&code) {
            parts.headers.insert(X_STORE_CODE, value);
        }
    }

    tracing::debug!(
        request_id = %request_id,
        uri = %parts.uri,
        "Forwarding request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
