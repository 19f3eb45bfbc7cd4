//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (stores reference existing websites, run
//!   codes reference existing stores)
//! - Check that every store a redirect can land on has a usable base URL
//! - Validate addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::store::scope::{BASE_URL_PATH, REDIRECTION_ENABLED_PATH};
use crate::store::{ConfigLookup, ScopeConfig, StoreLookup, StoreRegistry};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("store #{id} has an empty code")]
    EmptyStoreCode { id: u32 },

    #[error("duplicate store code \"{0}\"")]
    DuplicateStoreCode(String),

    #[error("duplicate website id {0}")]
    DuplicateWebsiteId(u32),

    #[error("store \"{store}\" references unknown website {website_id}")]
    UnknownWebsite { store: String, website_id: u32 },

    #[error("store \"{store}\" has an unusable base URL \"{url}\": {reason}")]
    InvalidBaseUrl {
        store: String,
        url: String,
        reason: String,
    },

    #[error("{field} references unknown store \"{code}\"")]
    UnknownStore { field: String, code: String },

    #[error("{field} is not a valid address: \"{address}\"")]
    InvalidAddress { field: &'static str, address: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_catalogue(config, &mut errors);
    check_store_references(config, &mut errors);
    check_base_urls(config, &mut errors);
    check_addresses(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_catalogue(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut website_ids = HashSet::new();
    for website in &config.websites {
        if !website_ids.insert(website.id) {
            errors.push(ValidationError::DuplicateWebsiteId(website.id));
        }
    }

    let mut codes = HashSet::new();
    for store in &config.stores {
        if store.code.is_empty() {
            errors.push(ValidationError::EmptyStoreCode { id: store.id });
        } else if !codes.insert(store.code.as_str()) {
            errors.push(ValidationError::DuplicateStoreCode(store.code.clone()));
        }

        if !website_ids.contains(&store.website_id) {
            errors.push(ValidationError::UnknownWebsite {
                store: store.code.clone(),
                website_id: store.website_id,
            });
        }
    }
}

fn check_store_references(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let known: HashSet<&str> = config.stores.iter().map(|s| s.code.as_str()).collect();
    let mut check = |field: String, code: &str| {
        if !known.contains(code) {
            errors.push(ValidationError::UnknownStore {
                field,
                code: code.to_string(),
            });
        }
    };

    if let Some(code) = &config.run_code.default {
        check("run_code.default".to_string(), code.as_str());
    }
    for (host, code) in &config.run_code.hosts {
        check(format!("run_code.hosts.\"{}\"", host), code.as_str());
    }
    if let Some(code) = &config.routing.default_store {
        check("routing.default_store".to_string(), code.as_str());
    }
}

/// Every store that can become a redirect target (a sibling of a store with
/// redirection enabled) needs an absolute http(s) base URL.
fn check_base_urls(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let registry = StoreRegistry::from_config(config);
    let scope = ScopeConfig::from_config(config);

    let redirecting_websites: HashSet<u32> = registry
        .stores()
        .filter(|store| scope.flag(REDIRECTION_ENABLED_PATH, store))
        .map(|store| store.website_id)
        .collect();

    for store in registry
        .stores()
        .filter(|store| redirecting_websites.contains(&store.website_id))
    {
        let url = scope.string(BASE_URL_PATH, store);
        if let Err(reason) = check_base_url(&url) {
            errors.push(ValidationError::InvalidBaseUrl {
                store: store.code.clone(),
                url,
                reason,
            });
        }
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    if raw.is_empty() {
        return Err("missing".to_string());
    }
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme \"{}\"", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

fn check_addresses(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            address: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            address: config.observability.metrics_address.clone(),
        });
    }

    if let Some(address) = &config.upstream.address {
        if address.parse::<Authority>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "upstream.address",
                address: address.clone(),
            });
        }
    }
}
