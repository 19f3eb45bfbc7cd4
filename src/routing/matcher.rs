//! Accept-Language prefix matching.
//!
//! # Responsibilities
//! - Compile configured language prefixes as `^<prefix>` patterns
//! - Memoise compiled patterns (and compile failures) per snapshot
//!
//! # Design Decisions
//! - Prefixes are NOT escaped: `en|fr` or `fr(-CA)?` keep regex meaning
//! - Headers are matched as raw bytes; obs-text octets are not an error
//! - `/` is the pattern delimiter and must be written `\/` inside a prefix
//! - A prefix that fails to compile never matches and is reported once
//! - Empty prefix compiles to `^` and matches every header

use dashmap::DashMap;
use regex::bytes::Regex;

/// Cache of compiled `^<prefix>` patterns keyed by the raw prefix.
#[derive(Debug, Default)]
pub struct PrefixPatternCache {
    patterns: DashMap<String, Option<Regex>>,
}

impl PrefixPatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `haystack` matches `^<prefix>`.
    pub fn is_match(&self, prefix: &str, haystack: &[u8]) -> bool {
        if let Some(entry) = self.patterns.get(prefix) {
            return entry.value().as_ref().is_some_and(|re| re.is_match(haystack));
        }

        let compiled = match compile(prefix) {
            Ok(re) => Some(re),
            Err(reason) => {
                tracing::warn!(
                    prefix = %prefix,
                    error = %reason,
                    "Invalid Accept-Language prefix pattern, treating as no match"
                );
                None
            }
        };
        let matched = compiled.as_ref().is_some_and(|re| re.is_match(haystack));
        self.patterns.insert(prefix.to_string(), compiled);
        matched
    }

    /// Number of distinct prefixes seen so far.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(prefix: &str) -> Result<Regex, String> {
    if has_unescaped_delimiter(prefix) {
        return Err("unescaped '/' delimiter".to_string());
    }
    Regex::new(&format!("^{}", prefix)).map_err(|e| e.to_string())
}

/// True if `prefix` contains a `/` not preceded by a backslash escape.
fn has_unescaped_delimiter(prefix: &str) -> bool {
    let mut escaped = false;
    for c in prefix.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => return true,
            _ => {}
        }
    }
    false
}
