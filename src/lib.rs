//! # Dupcheck
//!
//! Update-safe duplicate-value validation rules.
//!
//! The core is [`DuplicateRule`]: a stateless evaluator deciding whether a
//! candidate value should be flagged as a duplicate under a caller-supplied
//! predicate. The predicate owns all duplicate knowledge ("does a value equal
//! to this already exist in my store?"); the rule owns the policy, including
//! self-exemption for update workflows: a candidate equal to the subject's
//! own pre-existing value passes without the predicate ever being consulted,
//! so editing a record never flags its own unchanged field.
//!
//! ## Features
//!
//! - Sync rules driven by plain closures, async rules driven by a
//!   [`DuplicateProbe`]
//! - Self-exemption with a caller-overridable equality strategy
//! - Fluent per-field registration with `{PropertyName}` message templating
//! - Serializable rule configuration against a named predicate registry
//!
//! ## Example
//!
//! ```rust,ignore
//! use dupcheck::prelude::*;
//!
//! struct EditUser {
//!     original_email: String,
//!     email: String,
//! }
//!
//! let existing = vec!["a@x.com".to_string()];
//! let validator = Validator::new()
//!     .rule_for("Email", |u: &EditUser| u.email.clone())
//!     .duplicate_check_ignoring_self(
//!         move |email| existing.contains(email),
//!         |u: &EditUser| u.original_email.clone(),
//!     )
//!     .build();
//!
//! validator.validate(&user)?;
//! ```
//!
//! ## Failure format
//!
//! [`ValidationErrors::to_report`] produces JSON of the form:
//!
//! ```json
//! {
//!   "error": {
//!     "type": "validation_error",
//!     "message": "Validation failed",
//!     "fields": [
//!       {"field": "Email", "code": "duplicate", "message": "Email already exists."}
//!     ]
//!   }
//! }
//! ```

mod async_rule;
mod config;
mod error;
mod rule;
mod traits;
mod validator;


pub use async_rule::{AsyncDuplicateRule, DuplicateProbe};
pub use config::{DuplicateSpec, PredicateRegistry};
pub use error::{
    ConfigError, FieldFailure, ProbeError, ReportBody, RuleError, ValidationErrors,
    ValidationReport,
};
pub use rule::{
    DuplicateRule, SharedAccessor, SharedComparer, SharedPredicate, DEFAULT_DUPLICATE_MESSAGE,
};
pub use traits::{AsyncPropertyRule, PropertyRule, Validate};
pub use validator::{DuplicateCheckExt, RuleChain, Validator};

/// Prelude module for duplicate-value validation
pub mod prelude {
    pub use crate::async_rule::{AsyncDuplicateRule, DuplicateProbe};
    pub use crate::config::{DuplicateSpec, PredicateRegistry};
    pub use crate::error::{ConfigError, ProbeError, RuleError, ValidationErrors};
    pub use crate::rule::{DuplicateRule, DEFAULT_DUPLICATE_MESSAGE};
    pub use crate::traits::{AsyncPropertyRule, PropertyRule, Validate};
    pub use crate::validator::{DuplicateCheckExt, RuleChain, Validator};
}
