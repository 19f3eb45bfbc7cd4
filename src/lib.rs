//! Accept-Language Store Redirect Gateway Library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{ConfiguredRule, LocaleRedirectRule, RedirectDecision};
