//! Core validation traits.

use crate::error::{RuleError, ValidationErrors};
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for synchronous validation of a struct.
///
/// ## Example
///
/// ```rust,ignore
/// use dupcheck::prelude::*;
///
/// struct CreateUser {
///     username: String,
/// }
///
/// impl Validate for CreateUser {
///     fn validate(&self) -> Result<(), ValidationErrors> {
///         let mut errors = ValidationErrors::new();
///
///         let rule = DuplicateRule::new(|name: &String| name == "admin");
///         if let Err(e) = rule.check(self, &self.username) {
///             errors.add("username", e);
///         }
///
///         errors.into_result()
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the struct synchronously.
    ///
    /// Returns `Ok(())` if validation passes, or `Err(ValidationErrors)` with all field errors.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Validate and return the struct if valid.
    fn validated(self) -> Result<Self, ValidationErrors>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }
}

/// Trait for subject-aware property rules.
///
/// Unlike a plain value rule, a property rule sees both the candidate value
/// and the whole subject under validation. Duplicate checking needs this: the
/// self-exemption policy reads the subject's own pre-existing value to decide
/// whether the candidate should be exempt.
///
/// Rules are stateless between calls and may be shared across threads.
pub trait PropertyRule<T, V: ?Sized>: Debug + Send + Sync {
    /// Check the value against this rule in the context of `subject`.
    fn check(&self, subject: &T, value: &V) -> Result<(), RuleError>;

    /// Get the rule name/code for error reporting.
    fn rule_name(&self) -> &'static str;

    /// Get the default error message template for this rule.
    fn default_message(&self) -> String {
        format!("Validation failed for rule '{}'", self.rule_name())
    }
}

/// Trait for async property rules.
///
/// Use this when answering "does this value already exist?" requires an async
/// operation, like a database query or an API call.
#[async_trait]
pub trait AsyncPropertyRule<T: Sync, V: ?Sized + Sync>: Debug + Send + Sync {
    /// Check the value asynchronously in the context of `subject`.
    async fn check_async(&self, subject: &T, value: &V) -> Result<(), RuleError>;

    /// Get the rule name/code for error reporting.
    fn rule_name(&self) -> &'static str;

    /// Get the default error message template for this rule.
    fn default_message(&self) -> String {
        format!("Async validation failed for rule '{}'", self.rule_name())
    }
}
