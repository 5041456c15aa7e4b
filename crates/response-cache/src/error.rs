use runtime::kv::KvError;

/// User supplied hooks. Their failures abort the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Hook {
    SessionId,
    ExtraCacheKeyData,
    ShouldReadFromCache,
    ShouldWriteToCache,
    GenerateCacheKey,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    CacheGet(String),
    #[error("{0}")]
    CachePut(String),
    #[error("{0}")]
    CacheDelete(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("The {hook} hook failed: {message}")]
    Hook { hook: Hook, message: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid schema: {0}")]
    Schema(String),
    #[error("Execution error: {0}")]
    Execution(String),
}

impl Error {
    pub(crate) fn hook(hook: Hook, err: anyhow::Error) -> Self {
        Error::Hook {
            hook,
            message: format!("{err:#}"),
        }
    }

    pub(crate) fn from_kv(err: KvError, wrap: fn(String) -> Error) -> Self {
        match err {
            KvError::Serialization(err) => Error::Serialization(err.to_string()),
            KvError::Kv(message) => wrap(message),
        }
    }
}
