use std::{sync::Arc, time::Duration};

use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("Kv error: {0}")]
    Kv(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type KvResult<T> = Result<T, KvError>;

/// A cheaply cloneable handle to a key-value store.
///
/// Several unrelated consumers may share the same underlying store, they are expected to
/// namespace their keys themselves.
#[derive(Clone)]
pub struct KvStore(Arc<dyn KvStoreInner>);

impl KvStore {
    pub fn new(inner: impl KvStoreInner + 'static) -> Self {
        Self(Arc::new(inner))
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> KvResult<Option<T>> {
        let bytes = self.get(name).await?;
        bytes
            .map(|bytes| serde_json::from_slice(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn put_json<T: serde::Serialize>(
        &self,
        name: &str,
        value: &T,
        expiration_ttl: Option<Duration>,
    ) -> KvResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put(name, bytes.into(), expiration_ttl).await
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore").finish_non_exhaustive()
    }
}

impl std::ops::Deref for KvStore {
    type Target = dyn KvStoreInner;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

/// Contract every store implementation fulfills. `put` is last-write-wins per key and the
/// expiration is expressed as a [`Duration`], implementations convert it to whatever unit
/// their backend expects.
#[async_trait::async_trait]
pub trait KvStoreInner: Send + Sync {
    async fn get(&self, name: &str) -> KvResult<Option<Bytes>>;
    async fn put(&self, name: &str, bytes: Bytes, expiration_ttl: Option<Duration>) -> KvResult<()>;
    async fn delete(&self, name: &str) -> KvResult<()>;
}
