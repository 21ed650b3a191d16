//! The duplicate-value rule.

use crate::error::RuleError;
use crate::traits::PropertyRule;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Default failure message template. `{PropertyName}` is interpolated by the
/// registration harness, not by the rule.
pub const DEFAULT_DUPLICATE_MESSAGE: &str = "{PropertyName} already exists.";

/// Shared duplicate predicate: "does a value equal to this already exist?"
pub type SharedPredicate<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;
/// Shared self-value accessor: extracts the subject's own pre-existing value.
pub type SharedAccessor<T, V> = Arc<dyn Fn(&T) -> V + Send + Sync>;
/// Shared equality strategy for the self-match comparison.
pub type SharedComparer<V> = Arc<dyn Fn(&V, &V) -> bool + Send + Sync>;

/// Duplicate-value validation rule with optional self-exemption.
///
/// The rule answers one question: should this value be flagged as a
/// duplicate? The caller supplies the duplicate knowledge as a predicate
/// (`&V -> bool`, "does a value equal to this already exist elsewhere?");
/// the rule owns no lookup state of its own.
///
/// Self-exemption makes the rule update-safe: when enabled with a self-value
/// accessor, a candidate equal to the subject's own pre-existing value passes
/// unconditionally, so editing a record without changing the field never
/// flags the record as a duplicate of itself. In that case the predicate is
/// not consulted at all.
///
/// ## Example
///
/// ```rust,ignore
/// use dupcheck::prelude::*;
///
/// struct EditUser {
///     original_email: String,
///     email: String,
/// }
///
/// let taken = vec!["a@x.com".to_string()];
/// let rule = DuplicateRule::new(move |email: &String| taken.contains(email))
///     .ignoring_self(|user: &EditUser| user.original_email.clone());
///
/// let user = EditUser {
///     original_email: "a@x.com".to_string(),
///     email: "a@x.com".to_string(),
/// };
/// assert!(rule.check(&user, &user.email).is_ok());
/// ```
pub struct DuplicateRule<T, V> {
    predicate: SharedPredicate<V>,
    ignore_self: bool,
    self_value: Option<SharedAccessor<T, V>>,
    eq: Option<SharedComparer<V>>,
    message: Option<String>,
}

impl<T, V> DuplicateRule<T, V> {
    /// Create a rule from a duplicate predicate.
    ///
    /// The predicate answers "does a value equal to this already exist?".
    /// It is invoked at most once per check.
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
    {
        Self::shared(Arc::new(predicate))
    }

    /// Create a rule from an already-shared predicate.
    pub fn shared(predicate: SharedPredicate<V>) -> Self {
        Self {
            predicate,
            ignore_self: false,
            self_value: None,
            eq: None,
            message: None,
        }
    }

    /// Enable self-exemption and supply the self-value accessor in one step.
    ///
    /// The accessor extracts the subject's own pre-existing value for the
    /// field under validation (typically the stored value before an edit).
    pub fn ignoring_self<A>(self, accessor: A) -> Self
    where
        A: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.ignore_self(true).self_value(accessor)
    }

    /// Toggle self-exemption.
    ///
    /// Enabling it without a self-value accessor behaves exactly like leaving
    /// it disabled.
    pub fn ignore_self(mut self, ignore: bool) -> Self {
        self.ignore_self = ignore;
        self
    }

    /// Supply the self-value accessor used by self-exemption.
    pub fn self_value<A>(mut self, accessor: A) -> Self
    where
        A: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.self_value = Some(Arc::new(accessor));
        self
    }

    /// Override the equality strategy for the self-match comparison.
    ///
    /// Defaults to `PartialEq` structural equality.
    pub fn with_eq<F>(mut self, eq: F) -> Self
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        self.eq = Some(Arc::new(eq));
        self
    }

    /// Set a custom failure message template.
    ///
    /// The template passes through unmodified; `{PropertyName}` is filled in
    /// by the registration harness when the failure is reported.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn failure(&self) -> RuleError {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| DEFAULT_DUPLICATE_MESSAGE.to_string());
        RuleError::new("duplicate", message)
    }
}

impl<T, V: PartialEq> DuplicateRule<T, V> {
    /// Evaluate the rule for one subject/value pair.
    ///
    /// Policy, in order:
    /// 1. Self-exemption disabled, or no self-value accessor: valid iff the
    ///    predicate reports no duplicate.
    /// 2. Otherwise, if the subject's own value equals the candidate, the
    ///    result is valid and the predicate is never invoked.
    /// 3. Otherwise, valid iff the predicate reports no duplicate.
    ///
    /// Never panics; the only failure outcome is a `RuleError` data result.
    pub fn check(&self, subject: &T, value: &V) -> Result<(), RuleError> {
        if self.ignore_self {
            if let Some(accessor) = &self.self_value {
                let own = accessor(subject);
                if self.values_equal(&own, value) {
                    debug!(rule = "duplicate", "candidate matches subject's own value, exempt");
                    return Ok(());
                }
            }
        }

        if (self.predicate)(value) {
            trace!(rule = "duplicate", "predicate reported an existing value");
            Err(self.failure())
        } else {
            Ok(())
        }
    }

    fn values_equal(&self, a: &V, b: &V) -> bool {
        match &self.eq {
            Some(eq) => eq(a, b),
            None => a == b,
        }
    }
}

impl<T, V> Clone for DuplicateRule<T, V> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            ignore_self: self.ignore_self,
            self_value: self.self_value.clone(),
            eq: self.eq.clone(),
            message: self.message.clone(),
        }
    }
}

impl<T, V> fmt::Debug for DuplicateRule<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateRule")
            .field("ignore_self", &self.ignore_self)
            .field("has_self_value", &self.self_value.is_some())
            .field("has_custom_eq", &self.eq.is_some())
            .field("message", &self.message)
            .finish()
    }
}

impl<T, V> PropertyRule<T, V> for DuplicateRule<T, V>
where
    T: Send + Sync,
    V: PartialEq + Send + Sync,
{
    fn check(&self, subject: &T, value: &V) -> Result<(), RuleError> {
        DuplicateRule::check(self, subject, value)
    }

    fn rule_name(&self) -> &'static str {
        "duplicate"
    }

    fn default_message(&self) -> String {
        DEFAULT_DUPLICATE_MESSAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EditUser {
        original_email: String,
    }

    #[test]
    fn not_a_duplicate_is_valid() {
        let rule: DuplicateRule<(), String> = DuplicateRule::new(|v: &String| v == "admin");
        assert!(rule.check(&(), &"alice".to_string()).is_ok());
    }

    #[test]
    fn duplicate_is_invalid() {
        let rule: DuplicateRule<(), String> = DuplicateRule::new(|v: &String| v == "admin");
        let err = rule.check(&(), &"admin".to_string()).unwrap_err();
        assert_eq!(err.code, "duplicate");
        assert_eq!(err.message, DEFAULT_DUPLICATE_MESSAGE);
    }

    #[test]
    fn self_match_is_exempt() {
        let existing = vec!["a@x.com".to_string()];
        let rule = DuplicateRule::new(move |v: &String| existing.contains(v))
            .ignoring_self(|u: &EditUser| u.original_email.clone());

        let user = EditUser {
            original_email: "a@x.com".to_string(),
        };
        assert!(rule.check(&user, &"a@x.com".to_string()).is_ok());
    }

    #[test]
    fn different_value_is_still_checked() {
        let existing = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        let rule = DuplicateRule::new(move |v: &String| existing.contains(v))
            .ignoring_self(|u: &EditUser| u.original_email.clone());

        let user = EditUser {
            original_email: "a@x.com".to_string(),
        };
        assert!(rule.check(&user, &"b@x.com".to_string()).is_err());
    }

    #[test]
    fn self_exemption_never_consults_predicate_on_match() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        // Predicate flags everything; self-exemption must still win.
        let rule = DuplicateRule::new(move |_: &String| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .ignoring_self(|u: &EditUser| u.original_email.clone());

        let user = EditUser {
            original_email: "a@x.com".to_string(),
        };
        assert!(rule.check(&user, &"a@x.com".to_string()).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ignore_self_without_accessor_falls_back() {
        let rule: DuplicateRule<EditUser, String> =
            DuplicateRule::new(|v: &String| v == "a@x.com").ignore_self(true);

        let user = EditUser {
            original_email: "a@x.com".to_string(),
        };
        assert!(rule.check(&user, &"a@x.com".to_string()).is_err());
    }

    #[test]
    fn custom_message_passes_through_unmodified() {
        let rule: DuplicateRule<(), String> = DuplicateRule::new(|v: &String| v == "admin")
            .with_message("Duplicate {PropertyName} detected");

        let err = rule.check(&(), &"admin".to_string()).unwrap_err();
        assert_eq!(err.message, "Duplicate {PropertyName} detected");
    }

    #[test]
    fn custom_equality_is_used_for_self_match() {
        let existing = vec!["A@X.COM".to_string()];
        let rule = DuplicateRule::new(move |v: &String| existing.contains(v))
            .ignoring_self(|u: &EditUser| u.original_email.clone())
            .with_eq(|a: &String, b: &String| a.eq_ignore_ascii_case(b));

        // Stored value differs only in case; case-insensitive eq exempts it.
        let user = EditUser {
            original_email: "a@x.com".to_string(),
        };
        assert!(rule.check(&user, &"A@X.COM".to_string()).is_ok());
    }

    #[test]
    fn predicate_invoked_at_most_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let rule: DuplicateRule<(), String> = DuplicateRule::new(move |_: &String| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });

        rule.check(&(), &"value".to_string()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rule_is_send_and_sync() {
        fn assert_send_sync<X: Send + Sync>() {}
        assert_send_sync::<DuplicateRule<EditUser, String>>();
    }
}
