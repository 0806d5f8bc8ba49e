use std::collections::BTreeSet;

use solti_model::ConfigMap;

/// Keys never exposed through varz: bus credentials and key material.
pub const DEFAULT_DENIED_KEYS: &[&str] = &["mbus", "keys"];

/// Removes deny-listed top-level keys from a configuration snapshot.
///
/// Keys are compared in canonical form, so `mbus`, `:mbus` and `MBUS` all match the same entry.
#[derive(Debug, Clone)]
pub struct ConfigSanitizer {
    denied: BTreeSet<String>,
}

impl ConfigSanitizer {
    pub fn new() -> Self {
        Self {
            denied: DEFAULT_DENIED_KEYS.iter().map(|k| normalize_key(k)).collect(),
        }
    }

    /// Extend the deny-list.
    pub fn with_denied(mut self, key: impl AsRef<str>) -> Self {
        self.denied.insert(normalize_key(key.as_ref()));
        self
    }

    pub fn is_denied(&self, key: &str) -> bool {
        self.denied.contains(&normalize_key(key))
    }

    /// Copy of `config` without deny-listed keys; nested values are left as they are.
    pub fn sanitize(&self, config: &ConfigMap) -> ConfigMap {
        config
            .iter()
            .filter(|(key, _)| !self.is_denied(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Default for ConfigSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form of a config key: symbol prefix stripped, ASCII lowercase.
pub fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches(':').to_ascii_lowercase()
}
