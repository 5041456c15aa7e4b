use std::time::Duration;

use runtime::kv::KvStore;

use crate::{Error, ResolvedCachePolicy};

pub const DEFAULT_KEY_PREFIX: &str = "fqc:";

/// A cached response, as written to the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheValue {
    pub data: serde_json::Value,
    pub cache_policy: ResolvedCachePolicy,
    /// Milliseconds since the unix epoch at which the response was computed.
    pub cache_time: u64,
}

/// Namespaces response cache entries inside a shared key-value store.
#[derive(Clone, Debug)]
pub struct ResponseCacheStore {
    store: KvStore,
    prefix: String,
}

impl ResponseCacheStore {
    pub fn new(store: KvStore, prefix: impl Into<String>) -> Self {
        ResponseCacheStore {
            store,
            prefix: prefix.into(),
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Fails with [`Error::Serialization`] if the stored value cannot be decoded.
    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>, Error> {
        self.store
            .get_json(&self.prefixed(key))
            .await
            .map_err(|err| Error::from_kv(err, Error::CacheGet))
    }

    pub async fn set(&self, key: &str, value: &CacheValue, ttl: Duration) -> Result<(), Error> {
        self.store
            .put_json(&self.prefixed(key), value, Some(ttl))
            .await
            .map_err(|err| Error::from_kv(err, Error::CachePut))
    }

    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        self.store
            .delete(&self.prefixed(key))
            .await
            .map_err(|err| Error::from_kv(err, Error::CacheDelete))
    }
}
