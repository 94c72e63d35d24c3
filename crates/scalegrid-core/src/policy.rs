//! Enum-keyed policy tables.
//!
//! A `PolicyTable` maps a vocabulary key (resource type, capability type)
//! to a policy record, with one documented default for keys that have no
//! explicit entry. Tables are resolved once at construction; lookups never
//! fail and never allocate.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable<K: Ord, P> {
    default: P,
    entries: BTreeMap<K, P>,
}

impl<K: Ord + Copy, P> PolicyTable<K, P> {
    /// An empty table where every key resolves to `default`.
    pub fn new(default: P) -> Self {
        Self {
            default,
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace the entry for `key`.
    pub fn with(mut self, key: K, policy: P) -> Self {
        self.entries.insert(key, policy);
        self
    }

    /// Build a table from string-keyed config entries.
    ///
    /// Unknown keys are a configuration error rather than a silent fallback.
    pub fn from_named<'a, I>(default: P, named: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a String, &'a P)>,
        K: FromStr<Err = String>,
        P: Clone + 'a,
    {
        let mut table = Self::new(default);
        for (name, policy) in named {
            let key = name.parse::<K>().map_err(ConfigError::Invalid)?;
            table.entries.insert(key, policy.clone());
        }
        Ok(table)
    }

    /// Policy for `key`, falling back to the table default.
    pub fn resolve(&self, key: &K) -> &P {
        self.entries.get(key).unwrap_or(&self.default)
    }

    /// Whether `key` has an explicit entry.
    pub fn is_explicit(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn default_policy(&self) -> &P {
        &self.default
    }
}

impl<K: Ord + Copy + Display, P> PolicyTable<K, P> {
    /// Keys with explicit entries, for logging.
    pub fn explicit_keys(&self) -> Vec<String> {
        self.entries.keys().map(|k| k.to_string()).collect()
    }

    /// Explicit entries keyed by their config names; the inverse of
    /// `from_named`.
    pub fn to_named(&self) -> BTreeMap<String, P>
    where
        P: Clone,
    {
        self.entries
            .iter()
            .map(|(k, p)| (k.to_string(), p.clone()))
            .collect()
    }
}
