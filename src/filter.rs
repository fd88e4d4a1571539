//! Allow/deny filtering of metadata keys.
//!
//! The filter is read-only from the drawer's point of view; the settings
//! store owns the key list and mode and hands over a fresh [`KeyFilter`]
//! whenever they change.

use std::collections::BTreeSet;

/// How the configured keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Only configured keys are surfaced.
    Allow,
    /// Every key except the configured ones is surfaced.
    #[default]
    Deny,
}

/// Configured key names plus the allow/deny mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    keys: BTreeSet<String>,
    mode: FilterMode,
}

impl KeyFilter {
    /// Build a filter from explicit keys. Keys are trimmed, empty ones dropped.
    pub fn new<I, S>(keys: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys, mode }
    }

    /// Parse the comma-separated key list stored in settings.
    pub fn parse(list: &str, allow: bool) -> Self {
        let mode = if allow {
            FilterMode::Allow
        } else {
            FilterMode::Deny
        };
        Self::new(list.split(','), mode)
    }

    /// A filter that surfaces everything.
    pub fn surface_all() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Whether no keys are configured.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Decide whether `key` is shown and searchable.
    ///
    /// With no configured keys everything is surfaced, regardless of mode.
    pub fn is_key_surfaced(&self, key: &str) -> bool {
        if self.keys.is_empty() {
            return true;
        }

        let listed = self.keys.contains(key.trim());
        match self.mode {
            FilterMode::Allow => listed,
            FilterMode::Deny => !listed,
        }
    }
}

/// Free-function form of [`KeyFilter::is_key_surfaced`].
pub fn is_key_surfaced(key: &str, filter: &KeyFilter) -> bool {
    filter.is_key_surfaced(key)
}
