//! Store registry.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::GatewayConfig;

/// A configured store view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub id: u32,
    pub code: String,
    pub website_id: u32,
    pub name: String,
}

/// Errors raised by store lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store \"{0}\" not found")]
    NotFound(String),
}

/// Read access to the configured stores.
pub trait StoreLookup {
    /// Look up a store by code.
    fn store(&self, code: &str) -> Result<&Store, StoreError>;

    /// All stores, in enumeration order.
    fn stores(&self) -> impl Iterator<Item = &Store>;

    /// Stores belonging to the given website, in enumeration order.
    fn siblings(&self, website_id: u32) -> impl Iterator<Item = &Store> {
        self.stores().filter(move |s| s.website_id == website_id)
    }
}

/// In-memory store registry built from configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    stores: Vec<Store>,
    by_code: HashMap<String, usize>,
}

impl StoreRegistry {
    /// Build the registry from configuration, preserving declaration order.
    ///
    /// When a code is declared twice the first declaration wins; validation
    /// rejects such configs before they get here.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut registry = Self::default();

        for store in &config.stores {
            registry.push(Store {
                id: store.id,
                code: store.code.clone(),
                website_id: store.website_id,
                name: store.name.clone().unwrap_or_else(|| store.code.clone()),
            });
        }

        registry
    }

    fn push(&mut self, store: Store) {
        if self.by_code.contains_key(&store.code) {
            tracing::warn!(code = %store.code, "Duplicate store code ignored");
            return;
        }
        self.by_code.insert(store.code.clone(), self.stores.len());
        self.stores.push(store);
    }

    /// Number of registered stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl StoreLookup for StoreRegistry {
    fn store(&self, code: &str) -> Result<&Store, StoreError> {
        self.by_code
            .get(code)
            .map(|&idx| &self.stores[idx])
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }

    fn stores(&self) -> impl Iterator<Item = &Store> {
        self.stores.iter()
    }
}
