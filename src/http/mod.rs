//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → request.rs (request context: target, run code, headers)
//!     → middleware/locale_redirect.rs (resolve store, evaluate rule)
//!         → response.rs (302 + Location) on a decision
//!         → server.rs forward_handler (upstream) otherwise
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{locale_redirect_middleware, ResolvedStore};
pub use request::{MakeRequestUuid, RequestContext, RequestIdExt, X_REQUEST_ID, X_STORE_CODE};
pub use server::{AppState, HttpServer, Snapshot};
