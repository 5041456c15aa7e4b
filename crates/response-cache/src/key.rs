use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Which population of requests a cache entry is shared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    /// Anonymous requests.
    NoSession,
    /// A single session, identified by its id.
    Private,
    /// Any request with a session, for public data. Kept apart from anonymous requests.
    AuthenticatedPublic,
}

/// The identity of a request, independent of who sent it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseCacheKeyData {
    pub source: String,
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub extra: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualCacheKeyData {
    pub session_mode: SessionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ContextualCacheKeyData {
    pub fn no_session() -> Self {
        ContextualCacheKeyData {
            session_mode: SessionMode::NoSession,
            session_id: None,
        }
    }

    pub fn private(session_id: impl Into<String>) -> Self {
        ContextualCacheKeyData {
            session_mode: SessionMode::Private,
            session_id: Some(session_id.into()),
        }
    }

    pub fn authenticated_public() -> Self {
        ContextualCacheKeyData {
            session_mode: SessionMode::AuthenticatedPublic,
            session_id: None,
        }
    }
}

/// Everything a cache key is derived from.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CacheKeyData<'a> {
    #[serde(flatten)]
    pub base: &'a BaseCacheKeyData,
    #[serde(flatten)]
    pub contextual: &'a ContextualCacheKeyData,
}

impl<'a> CacheKeyData<'a> {
    pub fn new(base: &'a BaseCacheKeyData, contextual: &'a ContextualCacheKeyData) -> Self {
        CacheKeyData { base, contextual }
    }
}

/// Hex encoded SHA-256 of the JSON serialization of the key data.
pub fn default_cache_key(data: &CacheKeyData<'_>) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(data)?;
    Ok(hex::encode(Sha256::digest(bytes)))
}
