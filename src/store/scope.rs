//! Scoped configuration lookup.
//!
//! Values resolve from the most specific scope that defines them:
//! store, then website, then default.

use std::collections::HashMap;

use crate::config::schema::{ConfigValues, GatewayConfig};
use crate::store::Store;

/// Absolute base URL of a store.
pub const BASE_URL_PATH: &str = "web/secure/base_url";
/// Whether a store redirects root requests by Accept-Language.
pub const REDIRECTION_ENABLED_PATH: &str = "web/url/accept_language_redirection";
/// Pattern an Accept-Language header must start with to target a store.
pub const EXPECTED_LANGUAGE_PATH: &str = "web/url/accept_language_expected_value";

/// Read access to per-store configuration values.
pub trait ConfigLookup {
    /// Raw value at `path` for `store`, if any scope defines it.
    fn value(&self, path: &str, store: &Store) -> Option<String>;

    /// Value at `path` read as a flag. Missing, `""` and `"0"` are false.
    fn flag(&self, path: &str, store: &Store) -> bool {
        matches!(self.value(path, store), Some(v) if !v.is_empty() && v != "0")
    }

    /// Value at `path`, or the empty string.
    fn string(&self, path: &str, store: &Store) -> String {
        self.value(path, store).unwrap_or_default()
    }
}

/// Three-level configuration built from the gateway config.
#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
    defaults: ConfigValues,
    websites: HashMap<u32, ConfigValues>,
    stores: HashMap<String, ConfigValues>,
}

impl ScopeConfig {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut scope = Self {
            defaults: config.defaults.clone(),
            ..Self::default()
        };
        for website in &config.websites {
            scope
                .websites
                .entry(website.id)
                .or_insert_with(|| website.config.clone());
        }
        for store in &config.stores {
            scope
                .stores
                .entry(store.code.clone())
                .or_insert_with(|| store.config.clone());
        }
        scope
    }
}

impl ConfigLookup for ScopeConfig {
    fn value(&self, path: &str, store: &Store) -> Option<String> {
        self.stores
            .get(&store.code)
            .and_then(|values| values.get(path))
            .or_else(|| {
                self.websites
                    .get(&store.website_id)
                    .and_then(|values| values.get(path))
            })
            .or_else(|| self.defaults.get(path))
            .map(|v| v.to_string())
    }
}
