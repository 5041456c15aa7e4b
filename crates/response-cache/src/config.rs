use std::{future::Future, sync::Arc, time::Duration};

use futures_util::{future::BoxFuture, FutureExt};
use runtime::{
    kv::KvStore,
    time::{Clock, SystemClock},
};
use serde_with::DurationSeconds;

use crate::{CacheKeyData, Error, OperationContext, DEFAULT_KEY_PREFIX};

pub type SessionIdHook =
    Arc<dyn Fn(&OperationContext) -> BoxFuture<'static, anyhow::Result<Option<String>>> + Send + Sync>;
pub type ExtraCacheKeyDataHook =
    Arc<dyn Fn(&OperationContext) -> BoxFuture<'static, anyhow::Result<serde_json::Value>> + Send + Sync>;
pub type CachePredicateHook = Arc<dyn Fn(&OperationContext) -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync>;
pub type GenerateCacheKeyHook =
    Arc<dyn Fn(&OperationContext, &CacheKeyData<'_>) -> anyhow::Result<String> + Send + Sync>;

/// The static part of the configuration.
///
/// ```toml
/// default_max_age = 0
/// calculate_http_headers = true
/// key_prefix = "fqc:"
/// ```
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseCacheSettings {
    /// Max age of root fields and fields returning composite types without any hint.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub default_max_age: Duration,
    /// Whether responses get a `Cache-Control` header.
    pub calculate_http_headers: bool,
    pub key_prefix: String,
}

impl Default for ResponseCacheSettings {
    fn default() -> Self {
        ResponseCacheSettings {
            default_max_age: Duration::ZERO,
            calculate_http_headers: true,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl ResponseCacheSettings {
    pub fn from_toml(input: &str) -> Result<Self, Error> {
        toml::from_str(input).map_err(|err| Error::Config(err.to_string()))
    }
}

/// Settings plus the hooks a host uses to customize caching.
///
/// Hooks receive the operation being processed and return futures that must not borrow from it,
/// they copy whatever they need (typically a header) before awaiting anything.
#[derive(Clone)]
pub struct ResponseCacheConfig {
    pub settings: ResponseCacheSettings,
    /// Falls back to [`OperationContext::cache`] when absent.
    pub cache: Option<KvStore>,
    /// Identifies the session of a request. `None` means an anonymous request.
    pub session_id: Option<SessionIdHook>,
    /// Additional data mixed into every cache key.
    pub extra_cache_key_data: Option<ExtraCacheKeyDataHook>,
    pub should_read_from_cache: Option<CachePredicateHook>,
    pub should_write_to_cache: Option<CachePredicateHook>,
    pub generate_cache_key: Option<GenerateCacheKeyHook>,
    pub clock: Arc<dyn Clock>,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        ResponseCacheConfig {
            settings: ResponseCacheSettings::default(),
            cache: None,
            session_id: None,
            extra_cache_key_data: None,
            should_read_from_cache: None,
            should_write_to_cache: None,
            generate_cache_key: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl std::fmt::Debug for ResponseCacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCacheConfig")
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .field("session_id", &self.session_id.is_some())
            .field("extra_cache_key_data", &self.extra_cache_key_data.is_some())
            .field("should_read_from_cache", &self.should_read_from_cache.is_some())
            .field("should_write_to_cache", &self.should_write_to_cache.is_some())
            .field("generate_cache_key", &self.generate_cache_key.is_some())
            .finish_non_exhaustive()
    }
}

impl ResponseCacheConfig {
    pub fn new(settings: ResponseCacheSettings) -> Self {
        ResponseCacheConfig {
            settings,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: KvStore) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn with_session_id<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
    {
        let hook: SessionIdHook = Arc::new(move |operation: &OperationContext| hook(operation).boxed());
        self.session_id = Some(hook);
        self
    }

    #[must_use]
    pub fn with_extra_cache_key_data<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        let hook: ExtraCacheKeyDataHook = Arc::new(move |operation: &OperationContext| hook(operation).boxed());
        self.extra_cache_key_data = Some(hook);
        self
    }

    #[must_use]
    pub fn with_should_read_from_cache<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let hook: CachePredicateHook = Arc::new(move |operation: &OperationContext| hook(operation).boxed());
        self.should_read_from_cache = Some(hook);
        self
    }

    #[must_use]
    pub fn with_should_write_to_cache<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let hook: CachePredicateHook = Arc::new(move |operation: &OperationContext| hook(operation).boxed());
        self.should_write_to_cache = Some(hook);
        self
    }

    #[must_use]
    pub fn with_generate_cache_key<F>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationContext, &CacheKeyData<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let hook: GenerateCacheKeyHook = Arc::new(hook);
        self.generate_cache_key = Some(hook);
        self
    }
}
