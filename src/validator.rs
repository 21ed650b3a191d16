//! Fluent rule registration harness.
//!
//! A thin stand-in for the host validation framework: it binds rules to named
//! fields, runs one check per rule per validation pass, and fills the
//! `{PropertyName}` placeholder when reporting failures. The rules themselves
//! know nothing about it.

use crate::error::{RuleError, ValidationErrors};
use crate::rule::{DuplicateRule, SharedAccessor};
use crate::traits::PropertyRule;
use std::sync::Arc;

type BoundCheck<T> = Arc<dyn Fn(&T) -> Result<(), RuleError> + Send + Sync>;

struct FieldBinding<T> {
    name: String,
    checks: Vec<BoundCheck<T>>,
}

/// A validator holding rule bindings for the fields of `T`.
///
/// ## Example
///
/// ```rust,ignore
/// use dupcheck::prelude::*;
///
/// let taken = vec!["admin".to_string()];
/// let validator = Validator::new()
///     .rule_for("Username", |u: &CreateUser| u.username.clone())
///     .duplicate_check(move |name| taken.contains(name))
///     .build();
///
/// validator.validate(&user)?;
/// ```
pub struct Validator<T> {
    fields: Vec<FieldBinding<T>>,
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T> Validator<T> {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a rule chain for a field.
    ///
    /// `name` is the display name interpolated into `{PropertyName}`;
    /// `accessor` extracts the field's current value from the subject.
    pub fn rule_for<V, A>(self, name: impl Into<String>, accessor: A) -> RuleChain<T, V>
    where
        A: Fn(&T) -> V + Send + Sync + 'static,
    {
        RuleChain {
            validator: self,
            binding: FieldBinding {
                name: name.into(),
                checks: Vec::new(),
            },
            accessor: Arc::new(accessor),
        }
    }

    /// Run one validation pass over the subject.
    ///
    /// Every bound rule is invoked exactly once. Failures are collected per
    /// field with the field name attached as the `PropertyName` parameter.
    pub fn validate(&self, subject: &T) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in &self.fields {
            for check in &field.checks {
                if let Err(e) = check(subject) {
                    errors.add(
                        field.name.clone(),
                        e.param("PropertyName", field.name.as_str()),
                    );
                }
            }
        }
        errors.into_result()
    }
}

/// Builder for the rules of one field.
///
/// Produced by [`Validator::rule_for`]; chain rules onto it, then either
/// start the next field with [`rule_for`](RuleChain::rule_for) or finish
/// with [`build`](RuleChain::build).
pub struct RuleChain<T, V> {
    validator: Validator<T>,
    binding: FieldBinding<T>,
    accessor: SharedAccessor<T, V>,
}

impl<T: 'static, V: 'static> RuleChain<T, V> {
    /// Bind a property rule to this field.
    pub fn rule<R>(mut self, rule: R) -> Self
    where
        R: PropertyRule<T, V> + 'static,
    {
        let accessor = Arc::clone(&self.accessor);
        self.binding.checks.push(Arc::new(move |subject: &T| {
            let value = accessor(subject);
            rule.check(subject, &value)
        }));
        self
    }

    /// Finish this field and start a rule chain for the next one.
    pub fn rule_for<V2, A>(self, name: impl Into<String>, accessor: A) -> RuleChain<T, V2>
    where
        A: Fn(&T) -> V2 + Send + Sync + 'static,
    {
        self.build().rule_for(name, accessor)
    }

    /// Finish this field and return the validator.
    pub fn build(mut self) -> Validator<T> {
        self.validator.fields.push(self.binding);
        self.validator
    }
}

/// Fluent registration of duplicate checks on a rule chain.
///
/// Mirrors the shape of the underlying [`DuplicateRule`] constructors; use
/// [`RuleChain::rule`] directly when a custom message or equality strategy
/// is needed.
pub trait DuplicateCheckExt<T, V> {
    /// Flag the field when the predicate reports the value already exists.
    fn duplicate_check<P>(self, predicate: P) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static;

    /// Same check, exempting the subject's own pre-existing value.
    fn duplicate_check_ignoring_self<P, A>(self, predicate: P, self_value: A) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
        A: Fn(&T) -> V + Send + Sync + 'static;
}

impl<T, V> DuplicateCheckExt<T, V> for RuleChain<T, V>
where
    T: Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    fn duplicate_check<P>(self, predicate: P) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.rule(DuplicateRule::new(predicate))
    }

    fn duplicate_check_ignoring_self<P, A>(self, predicate: P, self_value: A) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
        A: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.rule(DuplicateRule::new(predicate).ignoring_self(self_value))
    }
}
