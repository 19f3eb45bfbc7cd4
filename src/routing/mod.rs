//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (target, run code, headers)
//!     → rule.rs (guard chain: resolved store, root target, run code, flag)
//!     → matcher.rs (Accept-Language vs. each sibling's prefix)
//!     → Return: RedirectDecision or None
//! ```
//!
//! # Design Decisions
//! - Rule built per config snapshot, immutable at runtime
//! - Deterministic: same input always yields the same decision
//! - First match wins (store enumeration order)
//! - Decision only; the HTTP layer issues the redirect

pub mod matcher;
pub mod rule;

pub use matcher::PrefixPatternCache;
pub use rule::{ConfiguredRule, LocaleRedirectRule, RedirectDecision};
