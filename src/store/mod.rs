//! Store catalogue subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayConfig (websites, stores, defaults)
//!     → registry.rs (StoreRegistry: code lookup, ordered enumeration)
//!     → scope.rs (ScopeConfig: store → website → default value fallback)
//!     → resolver.rs (which store a request resolves to)
//! ```
//!
//! # Design Decisions
//! - Built once per config snapshot, read-only afterwards
//! - Enumeration order is declaration order in the config file
//! - Lookups go through traits so the redirect rule can be tested with
//!   hand-built catalogues

pub mod registry;
pub mod resolver;
pub mod scope;

pub use registry::{Store, StoreError, StoreLookup, StoreRegistry};
pub use resolver::resolve_store_code;
pub use scope::{ConfigLookup, ScopeConfig};
