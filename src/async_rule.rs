//! Async duplicate checking.
//!
//! Same evaluation policy as [`DuplicateRule`](crate::rule::DuplicateRule),
//! with the duplicate lookup behind an async probe for backing stores that
//! must be consulted asynchronously (databases, remote APIs).

use crate::error::{ProbeError, RuleError};
use crate::rule::{SharedAccessor, SharedComparer, DEFAULT_DUPLICATE_MESSAGE};
use crate::traits::AsyncPropertyRule;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Async duplicate lookup.
///
/// Answers "does a value equal to this already exist elsewhere?" against a
/// caller-owned backing store. A `ProbeError` means the store could not be
/// consulted, not that the value is a duplicate.
#[async_trait]
pub trait DuplicateProbe<V: ?Sized>: Send + Sync {
    /// Check whether the value already exists.
    async fn is_duplicate(&self, value: &V) -> Result<bool, ProbeError>;
}

/// Duplicate-value rule backed by an async probe.
///
/// Evaluation follows the same policy as the sync rule: self-exemption, when
/// enabled with a self-value accessor, exempts a candidate equal to the
/// subject's own value without ever consulting the probe.
///
/// ## Example
///
/// ```rust,ignore
/// use dupcheck::prelude::*;
///
/// let rule = AsyncDuplicateRule::new(EmailTableProbe::new(pool))
///     .ignoring_self(|user: &EditUser| user.original_email.clone());
///
/// rule.check_async(&user, &user.email).await?;
/// ```
pub struct AsyncDuplicateRule<T, V> {
    probe: Arc<dyn DuplicateProbe<V>>,
    ignore_self: bool,
    self_value: Option<SharedAccessor<T, V>>,
    eq: Option<SharedComparer<V>>,
    message: Option<String>,
}

impl<T, V> AsyncDuplicateRule<T, V> {
    /// Create a rule from a duplicate probe.
    pub fn new(probe: impl DuplicateProbe<V> + 'static) -> Self {
        Self::from_arc(Arc::new(probe))
    }

    /// Create a rule from an already-shared probe.
    pub fn from_arc(probe: Arc<dyn DuplicateProbe<V>>) -> Self {
        Self {
            probe,
            ignore_self: false,
            self_value: None,
            eq: None,
            message: None,
        }
    }

    /// Enable self-exemption and supply the self-value accessor in one step.
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
    pub fn with_eq<F>(mut self, eq: F) -> Self
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        self.eq = Some(Arc::new(eq));
        self
    }

    /// Set a custom failure message template.
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

impl<T, V: PartialEq> AsyncDuplicateRule<T, V> {
    /// Evaluate the rule for one subject/value pair.
    ///
    /// A probe transport failure surfaces as a `RuleError` with code
    /// `duplicate_probe`; evaluation itself never panics.
    pub async fn check_async(&self, subject: &T, value: &V) -> Result<(), RuleError> {
        if self.ignore_self {
            if let Some(accessor) = &self.self_value {
                let own = accessor(subject);
                if self.values_equal(&own, value) {
                    debug!(rule = "duplicate", "candidate matches subject's own value, exempt");
                    return Ok(());
                }
            }
        }

        let is_duplicate = self.probe.is_duplicate(value).await.map_err(|e| {
            RuleError::new("duplicate_probe", format!("Duplicate probe failed: {e}"))
        })?;

        if is_duplicate {
            trace!(rule = "duplicate", "probe reported an existing value");
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

impl<T, V> Clone for AsyncDuplicateRule<T, V> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            ignore_self: self.ignore_self,
            self_value: self.self_value.clone(),
            eq: self.eq.clone(),
            message: self.message.clone(),
        }
    }
}

impl<T, V> fmt::Debug for AsyncDuplicateRule<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDuplicateRule")
            .field("ignore_self", &self.ignore_self)
            .field("has_self_value", &self.self_value.is_some())
            .field("has_custom_eq", &self.eq.is_some())
            .field("message", &self.message)
            .finish()
    }
}

#[async_trait]
impl<T, V> AsyncPropertyRule<T, V> for AsyncDuplicateRule<T, V>
where
    T: Send + Sync,
    V: PartialEq + Send + Sync,
{
    async fn check_async(&self, subject: &T, value: &V) -> Result<(), RuleError> {
        AsyncDuplicateRule::check_async(self, subject, value).await
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

    struct VecProbe {
        existing: Vec<String>,
        calls: AtomicUsize,
    }

    impl VecProbe {
        fn new(existing: Vec<&str>) -> Self {
            Self {
                existing: existing.into_iter().map(String::from).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DuplicateProbe<String> for VecProbe {
        async fn is_duplicate(&self, value: &String) -> Result<bool, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.existing.contains(value))
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl DuplicateProbe<String> for FailingProbe {
        async fn is_duplicate(&self, _value: &String) -> Result<bool, ProbeError> {
            Err(ProbeError::new("connection refused"))
        }
    }

    #[tokio::test]
    async fn new_value_is_valid() {
        let rule: AsyncDuplicateRule<(), String> =
            AsyncDuplicateRule::new(VecProbe::new(vec!["taken@x.com"]));
        assert!(rule.check_async(&(), &"new@x.com".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn existing_value_is_invalid() {
        let rule: AsyncDuplicateRule<(), String> =
            AsyncDuplicateRule::new(VecProbe::new(vec!["taken@x.com"]));
        let err = rule
            .check_async(&(), &"taken@x.com".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code, "duplicate");
    }

    #[tokio::test]
    async fn self_match_skips_probe() {
        let probe = Arc::new(VecProbe::new(vec!["a@x.com"]));
        let rule = AsyncDuplicateRule::from_arc(probe.clone() as Arc<dyn DuplicateProbe<String>>)
            .ignoring_self(|u: &EditUser| u.original_email.clone());

        let user = EditUser {
            original_email: "a@x.com".to_string(),
        };
        assert!(rule.check_async(&user, &"a@x.com".to_string()).await.is_ok());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn probe_failure_is_reported_not_panicked() {
        let rule: AsyncDuplicateRule<(), String> = AsyncDuplicateRule::new(FailingProbe);
        let err = rule.check_async(&(), &"x".to_string()).await.unwrap_err();
        assert_eq!(err.code, "duplicate_probe");
        assert!(err.message.contains("connection refused"));
    }
}
