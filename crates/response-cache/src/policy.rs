use std::time::Duration;

use serde_with::DurationSeconds;

use crate::{CacheHint, CacheScope};

/// Accumulates cache hints into the most restrictive `{max_age, scope}` seen so far.
///
/// Hints folded with [`CachePolicy::restrict`] can only lower the max age and widen the scope to
/// private, so the outcome does not depend on the order in which fields report their hints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    max_age: Option<Duration>,
    scope: CacheScope,
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn scope(&self) -> CacheScope {
        self.scope
    }

    /// Overwrites the fields present in the hint.
    pub fn replace(&mut self, hint: &CacheHint) {
        if let Some(max_age) = hint.max_age {
            self.max_age = Some(max_age);
        }
        if let Some(scope) = hint.scope {
            self.scope = scope;
        }
    }

    /// Applies the fields present in the hint only if they make the policy stricter.
    pub fn restrict(&mut self, hint: &CacheHint) {
        if let Some(max_age) = hint.max_age {
            self.max_age = Some(self.max_age.map_or(max_age, |current| current.min(max_age)));
        }
        if hint.scope == Some(CacheScope::Private) {
            self.scope = CacheScope::Private;
        }
    }

    /// The resolved policy, or `None` if the response must not be cached.
    ///
    /// The max age is truncated to whole seconds, so anything below one second is uncacheable.
    pub fn policy_if_cacheable(&self) -> Option<ResolvedCachePolicy> {
        let max_age = Duration::from_secs(self.max_age?.as_secs());
        if max_age.is_zero() {
            return None;
        }
        Some(ResolvedCachePolicy {
            max_age,
            scope: self.scope,
        })
    }

    pub fn as_hint(&self) -> CacheHint {
        CacheHint {
            max_age: self.max_age,
            scope: Some(self.scope),
            inherit_max_age: false,
        }
    }
}

/// A policy with a strictly positive max age, as stored alongside cached responses.
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCachePolicy {
    #[serde_as(as = "DurationSeconds<u64>")]
    pub max_age: Duration,
    pub scope: CacheScope,
}

impl From<ResolvedCachePolicy> for CacheHint {
    fn from(policy: ResolvedCachePolicy) -> Self {
        CacheHint {
            max_age: Some(policy.max_age),
            scope: Some(policy.scope),
            inherit_max_age: false,
        }
    }
}
