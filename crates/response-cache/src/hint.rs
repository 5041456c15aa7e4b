use std::time::Duration;

/// Who a cached response may be shared with.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CacheScope {
    /// Shareable across every client.
    #[default]
    Public,
    /// Only shareable with the session that produced it.
    Private,
}

/// A single cache annotation, contributed by a type, a field or a resolver.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheHint {
    pub max_age: Option<Duration>,
    pub scope: Option<CacheScope>,
    /// The field takes its max age from its closest ancestor instead of the server default.
    pub inherit_max_age: bool,
}

impl CacheHint {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: CacheScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn inheriting_max_age(mut self) -> Self {
        self.inherit_max_age = true;
        self
    }

    /// A hint without max age nor scope does not contribute anything to a policy.
    pub fn is_empty(&self) -> bool {
        self.max_age.is_none() && self.scope.is_none()
    }
}
