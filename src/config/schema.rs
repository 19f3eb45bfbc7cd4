//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the locale redirect gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Application the gateway forwards non-redirected traffic to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// How the run code is derived for a request.
    pub run_code: RunCodeConfig,

    /// Store resolution settings.
    pub routing: RoutingConfig,

    /// Default-scope configuration values, keyed by config path.
    pub defaults: ConfigValues,

    /// Website definitions.
    pub websites: Vec<WebsiteConfig>,

    /// Store definitions, in enumeration order.
    pub stores: Vec<StoreConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). Pass-through requests get
    /// a 404 when unset.
    pub address: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Run code derivation.
///
/// Sources are consulted in order: trusted header, host mapping, default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RunCodeConfig {
    /// Request header set by a trusted front (e.g. "x-run-code").
    pub header: Option<String>,

    /// Host name to run code mapping. Hosts are compared case-insensitively
    /// without the port.
    pub hosts: BTreeMap<String, String>,

    /// Run code used when no other source yields one.
    pub default: Option<String>,
}

/// Store resolution configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Treat the first path segment as a store code when it names a store.
    pub use_store_code_in_url: bool,

    /// Store used when neither the URL nor the run code resolve one.
    pub default_store: Option<String>,
}

/// Website definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebsiteConfig {
    /// Numeric website id, the grouping key for stores.
    pub id: u32,

    /// Website code.
    pub code: String,

    /// Website-scope configuration values.
    #[serde(default)]
    pub config: ConfigValues,
}

/// Store definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Numeric store id.
    pub id: u32,

    /// Store code, matched against the run code.
    pub code: String,

    /// Website this store belongs to.
    pub website_id: u32,

    /// Display name (defaults to the code).
    #[serde(default)]
    pub name: Option<String>,

    /// Store-scope configuration values.
    #[serde(default)]
    pub config: ConfigValues,
}

/// Configuration values keyed by path (e.g. "web/secure/base_url").
pub type ConfigValues = BTreeMap<String, ConfigValue>;

/// A scalar configuration value.
///
/// Values are always read back as strings: `true` becomes `"1"`, `false`
/// becomes the empty string, floats keep 14 significant digits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(true) => f.write_str("1"),
            ConfigValue::Bool(false) => Ok(()),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => f.write_str(&format_float(*v)),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

/// Significant digits kept when a float is read back as a string.
const FLOAT_PRECISION: i32 = 14;

/// `%G`-style rendering: fixed notation for moderate exponents, otherwise
/// `<mantissa>E<sign><exp>` with at least one fractional digit.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NAN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, v);
    let (mantissa, exp) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exp < -4 || exp >= FLOAT_PRECISION {
        let mantissa = trim_fraction(mantissa);
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{}.0", mantissa)
        };
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}E{}{}", mantissa, sign, exp.abs())
    } else {
        let decimals = (FLOAT_PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}
