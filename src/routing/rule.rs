//! Accept-Language store redirection.
//!
//! A request for the bare site root (`/`) whose run-code store has
//! redirection enabled is sent to the first sibling store (same website)
//! whose expected language prefix matches the `Accept-Language` header.
//! Everything else passes through untouched.

use serde::Serialize;

use crate::config::GatewayConfig;
use crate::http::request::RequestContext;
use crate::routing::matcher::PrefixPatternCache;
use crate::store::scope::{BASE_URL_PATH, EXPECTED_LANGUAGE_PATH, REDIRECTION_ENABLED_PATH};
use crate::store::{ConfigLookup, ScopeConfig, StoreLookup, StoreRegistry};

/// Request target the rule applies to.
pub const ROOT_TARGET: &str = "/";

/// Outcome of a matching evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectDecision {
    /// Base URL of the matched store.
    pub target_url: String,
    /// Code of the matched store.
    pub store_code: String,
}

/// Decides whether a root request is redirected to a sibling store.
#[derive(Debug)]
pub struct LocaleRedirectRule<S, C> {
    stores: S,
    config: C,
    patterns: PrefixPatternCache,
}

/// The rule as built from a gateway config file.
pub type ConfiguredRule = LocaleRedirectRule<StoreRegistry, ScopeConfig>;

impl ConfiguredRule {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            StoreRegistry::from_config(config),
            ScopeConfig::from_config(config),
        )
    }
}

impl<S: StoreLookup, C: ConfigLookup> LocaleRedirectRule<S, C> {
    pub fn new(stores: S, config: C) -> Self {
        Self {
            stores,
            config,
            patterns: PrefixPatternCache::new(),
        }
    }

    pub fn stores(&self) -> &S {
        &self.stores
    }

    /// Evaluate the rule for one request.
    ///
    /// `resolved_store_code` is the store the request resolved to without
    /// redirection; nothing happens when it is absent.
    pub fn evaluate(
        &self,
        resolved_store_code: Option<&str>,
        request: &RequestContext,
    ) -> Option<RedirectDecision> {
        if !matches!(resolved_store_code, Some(code) if !code.is_empty()) {
            return None;
        }

        if request.target() != ROOT_TARGET {
            return None;
        }

        let run_code = request.run_code().filter(|code| !code.is_empty())?;

        // Unknown run code means no opinion, not an error.
        let store = self.stores.store(run_code).ok()?;

        if !self.config.flag(REDIRECTION_ENABLED_PATH, store) {
            return None;
        }

        let accept_language = request.accept_language();

        let decision = self
            .stores
            .siblings(store.website_id)
            .find(|candidate| {
                let prefix = self.config.string(EXPECTED_LANGUAGE_PATH, candidate);
                self.patterns.is_match(&prefix, accept_language)
            })
            .map(|target| RedirectDecision {
                target_url: self.config.string(BASE_URL_PATH, target),
                store_code: target.code.clone(),
            });

        tracing::debug!(
            run_code = %run_code,
            accept_language = %String::from_utf8_lossy(accept_language),
            target = ?decision.as_ref().map(|d| d.store_code.as_str()),
            "Evaluated Accept-Language redirection"
        );

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ConfigValue, StoreConfig, WebsiteConfig};
    use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

    fn store(
        id: u32,
        code: &str,
        website_id: u32,
        enabled: &str,
        prefix: &str,
        base_url: &str,
    ) -> StoreConfig {
        let mut store = StoreConfig {
            id,
            code: code.into(),
            website_id,
            name: None,
            config: Default::default(),
        };
        store
            .config
            .insert(REDIRECTION_ENABLED_PATH.into(), ConfigValue::from(enabled));
        store
            .config
            .insert(EXPECTED_LANGUAGE_PATH.into(), ConfigValue::from(prefix));
        store
            .config
            .insert(BASE_URL_PATH.into(), ConfigValue::from(base_url));
        store
    }

    fn base_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        for (id, code) in [(1, "base"), (2, "b2b")] {
            config.websites.push(WebsiteConfig {
                id,
                code: code.into(),
                config: Default::default(),
            });
        }
        config
            .stores
            .push(store(1, "us", 1, "1", "en", "https://example.com/"));
        config
            .stores
            .push(store(2, "fr", 1, "1", "fr", "https://example.fr/"));
        config
    }

    fn request(target: &str, run_code: Option<&str>, accept_language: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(value) = accept_language {
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        }
        RequestContext::new(target, run_code.map(String::from), headers)
    }

    fn redirect_to(url: &str, code: &str) -> Option<RedirectDecision> {
        Some(RedirectDecision {
            target_url: url.into(),
            store_code: code.into(),
        })
    }

    #[test]
    fn test_redirects_to_matching_sibling() {
        let rule = ConfiguredRule::from_config(&base_config());
        let req = request("/", Some("us"), Some("fr-FR"));
        assert_eq!(
            rule.evaluate(Some("us"), &req),
            redirect_to("https://example.fr/", "fr")
        );
    }

    #[test]
    fn test_disabled_on_run_code_store() {
        let mut config = base_config();
        config.stores[0]
            .config
            .insert(REDIRECTION_ENABLED_PATH.into(), "0".into());
        let rule = ConfiguredRule::from_config(&config);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("fr-FR"))),
            None
        );
    }

    #[test]
    fn test_enabled_flag_only_read_from_run_code_store() {
        // Target store disabling redirection does not stop it being a target.
        let mut config = base_config();
        config.stores[1]
            .config
            .insert(REDIRECTION_ENABLED_PATH.into(), "".into());
        let rule = ConfiguredRule::from_config(&config);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("fr-FR"))),
            redirect_to("https://example.fr/", "fr")
        );
    }

    #[test]
    fn test_non_root_target_never_redirects() {
        let rule = ConfiguredRule::from_config(&base_config());
        for target in ["/catalog", "", "/?foo=bar", "//", "/fr/"] {
            assert_eq!(
                rule.evaluate(Some("us"), &request(target, Some("us"), Some("fr-FR"))),
                None,
                "target {:?}",
                target
            );
        }
    }

    #[test]
    fn test_missing_resolved_store_never_redirects() {
        let rule = ConfiguredRule::from_config(&base_config());
        let req = request("/", Some("us"), Some("fr-FR"));
        assert_eq!(rule.evaluate(None, &req), None);
        assert_eq!(rule.evaluate(Some(""), &req), None);
    }

    #[test]
    fn test_missing_or_unknown_run_code() {
        let rule = ConfiguredRule::from_config(&base_config());
        assert_eq!(rule.evaluate(Some("us"), &request("/", None, Some("fr"))), None);
        assert_eq!(rule.evaluate(Some("us"), &request("/", Some(""), Some("fr"))), None);
        assert_eq!(rule.evaluate(Some("us"), &request("/", Some("xx"), Some("fr"))), None);
    }

    #[test]
    fn test_first_matching_sibling_wins() {
        let mut config = base_config();
        config
            .stores
            .push(store(3, "fr_ca", 1, "1", "fr", "https://example.ca/"));
        let rule = ConfiguredRule::from_config(&config);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("fr-CA"))),
            redirect_to("https://example.fr/", "fr")
        );
    }

    #[test]
    fn test_run_code_store_itself_can_match() {
        let rule = ConfiguredRule::from_config(&base_config());
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("en-US,en;q=0.9"))),
            redirect_to("https://example.com/", "us")
        );
    }

    #[test]
    fn test_other_website_is_never_a_target() {
        let mut config = base_config();
        config
            .stores
            .insert(0, store(3, "pro_de", 2, "1", "de", "https://pro.example.de/"));
        let rule = ConfiguredRule::from_config(&config);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("de-DE"))),
            None
        );
    }

    #[test]
    fn test_no_header_and_no_match() {
        let rule = ConfiguredRule::from_config(&base_config());
        assert_eq!(rule.evaluate(Some("us"), &request("/", Some("us"), None)), None);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("ja-JP"))),
            None
        );
    }

    #[test]
    fn test_empty_prefix_matches_any_header() {
        let mut config = base_config();
        config.stores[0]
            .config
            .insert(EXPECTED_LANGUAGE_PATH.into(), "".into());
        let rule = ConfiguredRule::from_config(&config);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), None)),
            redirect_to("https://example.com/", "us")
        );
    }

    #[test]
    fn test_regex_prefix_and_invalid_prefix() {
        let mut config = base_config();
        config.stores[0]
            .config
            .insert(EXPECTED_LANGUAGE_PATH.into(), "en(".into());
        config.stores[1]
            .config
            .insert(EXPECTED_LANGUAGE_PATH.into(), "(fr|en)".into());
        let rule = ConfiguredRule::from_config(&config);
        assert_eq!(
            rule.evaluate(Some("us"), &request("/", Some("us"), Some("en-GB"))),
            redirect_to("https://example.fr/", "fr")
        );
    }

    #[test]
    fn test_obs_text_header_is_matched_bytewise() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_bytes(b"fr-FR,fr;q=0.9,x-\xe9").unwrap(),
        );
        let req = RequestContext::new("/", Some("us".to_string()), headers);
        let rule = ConfiguredRule::from_config(&base_config());
        assert_eq!(
            rule.evaluate(Some("us"), &req),
            redirect_to("https://example.fr/", "fr")
        );
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let rule = ConfiguredRule::from_config(&base_config());
        let req = request("/", Some("us"), Some("fr-FR"));
        let first = rule.evaluate(Some("us"), &req);
        let second = rule.evaluate(Some("us"), &req);
        assert_eq!(first, second);
        assert!(first.is_some());
    }
}
