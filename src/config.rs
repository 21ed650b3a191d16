//! Serializable rule configuration.
//!
//! A [`DuplicateSpec`] describes a duplicate rule by name so it can live in
//! configuration files; predicates themselves are code, registered under
//! those names in a [`PredicateRegistry`]. Building a spec against a registry
//! that lacks the named predicate fails fast with a [`ConfigError`].

use crate::error::ConfigError;
use crate::rule::{DuplicateRule, SharedPredicate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Serialized description of a duplicate rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateSpec {
    /// Registry name of the duplicate predicate
    pub predicate: String,
    /// Whether the subject's own value is exempt
    #[serde(default)]
    pub ignore_self: bool,
    /// Custom failure message template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DuplicateSpec {
    /// Create a spec referencing a registered predicate.
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            ignore_self: false,
            message: None,
        }
    }

    /// Exempt the subject's own value.
    ///
    /// The self-value accessor is code, not configuration; it is supplied on
    /// the built rule via [`DuplicateRule::self_value`]. Until then the flag
    /// has no effect.
    pub fn ignoring_self(mut self) -> Self {
        self.ignore_self = true;
        self
    }

    /// Set a custom failure message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Build the rule against a predicate registry.
    ///
    /// Fails with [`ConfigError::UnknownPredicate`] when the named predicate
    /// was never registered. No evaluation happens on this path.
    pub fn build<T, V>(&self, registry: &PredicateRegistry<V>) -> Result<DuplicateRule<T, V>, ConfigError> {
        let predicate = registry
            .get(&self.predicate)
            .ok_or_else(|| ConfigError::UnknownPredicate {
                name: self.predicate.clone(),
            })?;

        let mut rule = DuplicateRule::shared(predicate).ignore_self(self.ignore_self);
        if let Some(message) = &self.message {
            rule = rule.with_message(message.clone());
        }
        Ok(rule)
    }
}

/// Named duplicate predicates available to config-driven rules.
pub struct PredicateRegistry<V> {
    entries: HashMap<String, SharedPredicate<V>>,
}

impl<V> Default for PredicateRegistry<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> PredicateRegistry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under a name, replacing any previous entry.
    pub fn register<P>(mut self, name: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(predicate));
        self
    }

    /// Look up a predicate by name.
    pub fn get(&self, name: &str) -> Option<SharedPredicate<V>> {
        self.entries.get(name).map(Arc::clone)
    }

    /// Names of all registered predicates.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

impl<V> fmt::Debug for PredicateRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
