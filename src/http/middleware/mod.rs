//! Request middleware.

pub mod locale_redirect;

pub use locale_redirect::{locale_redirect_middleware, ResolvedStore};
