use std::sync::Arc;

use futures_util::FutureExt;
use headers::HeaderMapExt;
use runtime::{context::RequestContext, time::rounded_age_seconds};
use serde_json::Value;
use tracing::Instrument;

use crate::{
    default_cache_key, request::ResponseCacheState, BaseCacheKeyData, CacheKeyData, CacheScope, CacheValue,
    ContextualCacheKeyData, Error, HintCollector, Hook, OperationContext, OperationType, Response, ResponseBody,
    ResponseCacheConfig, ResponseCacheSettings, ResponseCacheStore,
};

/// Reads whole responses from the cache before execution and writes cacheable ones back once
/// they are sent.
#[derive(Clone, Debug)]
pub struct ResponseCachePlugin {
    config: Arc<ResponseCacheConfig>,
}

impl ResponseCachePlugin {
    pub fn new(config: ResponseCacheConfig) -> Self {
        ResponseCachePlugin {
            config: Arc::new(config),
        }
    }

    pub fn settings(&self) -> &ResponseCacheSettings {
        &self.config.settings
    }

    /// A fresh collector for the execution of a single operation.
    pub fn hint_collector(&self) -> HintCollector {
        HintCollector::new(self.config.settings.default_max_age)
    }

    fn store(&self, operation: &OperationContext) -> Option<ResponseCacheStore> {
        let cache = self.config.cache.clone().or_else(|| operation.cache.clone())?;
        Some(ResponseCacheStore::new(cache, self.config.settings.key_prefix.clone()))
    }

    fn cache_key(
        &self,
        operation: &OperationContext,
        base: &BaseCacheKeyData,
        contextual: &ContextualCacheKeyData,
    ) -> Result<String, Error> {
        let data = CacheKeyData::new(base, contextual);

        match &self.config.generate_cache_key {
            Some(hook) => hook(operation, &data).map_err(|err| Error::hook(Hook::GenerateCacheKey, err)),
            None => default_cache_key(&data).map_err(|err| Error::Serialization(err.to_string())),
        }
    }

    /// Returns the cached data of the operation if there is any. On a hit the overall cache
    /// policy of the operation is replaced by the stored one and execution should be skipped.
    ///
    /// Store failures are misses, hook failures abort the request.
    pub async fn response_for_operation(
        &self,
        ctx: &impl RequestContext,
        operation: &mut OperationContext,
    ) -> Result<Option<Value>, Error> {
        if operation.operation_type != OperationType::Query {
            return Ok(None);
        }
        let Some(store) = self.store(operation) else {
            return Ok(None);
        };

        let extra = match &self.config.extra_cache_key_data {
            Some(hook) => hook(operation)
                .await
                .map_err(|err| Error::hook(Hook::ExtraCacheKeyData, err))?,
            None => Value::Null,
        };
        let session_id = match &self.config.session_id {
            Some(hook) => hook(operation).await.map_err(|err| Error::hook(Hook::SessionId, err))?,
            None => None,
        };

        operation.cache_state = ResponseCacheState {
            base_key: Some(BaseCacheKeyData {
                source: operation.request.query.clone(),
                operation_name: operation.request.operation_name.clone(),
                variables: operation.request.variables.clone(),
                extra,
            }),
            session_id,
            cache_time: None,
        };

        if let Some(hook) = &self.config.should_read_from_cache {
            let should_read = hook(operation)
                .await
                .map_err(|err| Error::hook(Hook::ShouldReadFromCache, err))?;
            if !should_read {
                return Ok(None);
            }
        }

        let candidates = match &operation.cache_state.session_id {
            None => vec![ContextualCacheKeyData::no_session()],
            Some(session_id) => vec![
                ContextualCacheKeyData::private(session_id.clone()),
                ContextualCacheKeyData::authenticated_public(),
            ],
        };

        let mut hit = None;
        if let Some(base) = &operation.cache_state.base_key {
            for contextual in &candidates {
                let key = self.cache_key(operation, base, contextual)?;
                if let Some(value) = lookup(ctx, &store, &key).await {
                    hit = Some(value);
                    break;
                }
            }
        }

        let Some(value) = hit else {
            return Ok(None);
        };

        operation.response_cache_hit = true;
        operation.overall_cache_policy.replace(&value.cache_policy.into());
        operation.cache_state.cache_time = Some(value.cache_time);

        Ok(Some(value.data))
    }

    /// Sets the `Age` header of responses served from the cache and writes cacheable responses
    /// to the store in the background.
    pub async fn will_send_response(
        &self,
        ctx: &impl RequestContext,
        operation: &OperationContext,
        response: &mut Response,
    ) -> Result<(), Error> {
        if operation.operation_type != OperationType::Query {
            return Ok(());
        }

        if operation.response_cache_hit {
            if let Some(cache_time) = operation.cache_state.cache_time {
                let age = rounded_age_seconds(cache_time, self.config.clock.now_millis());
                response.headers.typed_insert(headers::Age::from_secs(age));
            }
            return Ok(());
        }

        let Some(base) = &operation.cache_state.base_key else {
            return Ok(());
        };
        let ResponseBody::Single(result) = &response.body else {
            return Ok(());
        };
        if !result.errors.is_empty() {
            return Ok(());
        }
        let Some(data) = &result.data else {
            return Ok(());
        };

        if let Some(hook) = &self.config.should_write_to_cache {
            let should_write = hook(operation)
                .await
                .map_err(|err| Error::hook(Hook::ShouldWriteToCache, err))?;
            if !should_write {
                return Ok(());
            }
        }

        let Some(policy) = operation.overall_cache_policy.policy_if_cacheable() else {
            return Ok(());
        };

        let contextual = match (policy.scope, &operation.cache_state.session_id) {
            (CacheScope::Private, _) if self.config.session_id.is_none() => {
                tracing::warn!(
                    ray_id = ctx.ray_id(),
                    "A GraphQL response used private scope but no session_id hook is configured, it will not be cached"
                );
                return Ok(());
            }
            (CacheScope::Private, None) => return Ok(()),
            (CacheScope::Private, Some(session_id)) => ContextualCacheKeyData::private(session_id.clone()),
            (CacheScope::Public, Some(_)) => ContextualCacheKeyData::authenticated_public(),
            (CacheScope::Public, None) => ContextualCacheKeyData::no_session(),
        };

        let key = self.cache_key(operation, base, &contextual)?;
        let Some(store) = self.store(operation) else {
            return Ok(());
        };
        let value = CacheValue {
            data: data.clone(),
            cache_policy: policy,
            cache_time: self.config.clock.now_millis(),
        };

        let ray_id = ctx.ray_id().to_string();
        ctx.wait_until(
            async move {
                if let Err(err) = store
                    .set(&key, &value, policy.max_age)
                    .instrument(tracing::info_span!("cache_put"))
                    .await
                {
                    tracing::error!(ray_id, "Error cache PUT: {}", err);
                }
            }
            .boxed(),
        )
        .await;

        Ok(())
    }
}

async fn lookup(ctx: &impl RequestContext, store: &ResponseCacheStore, key: &str) -> Option<CacheValue> {
    let result = store
        .get(key)
        .instrument(tracing::info_span!("cache_get", ray_id = ctx.ray_id()))
        .await;

    match result {
        Ok(Some(value)) => {
            tracing::info!(ray_id = ctx.ray_id(), "Cache HIT - {}", key);
            Some(value)
        }
        Ok(None) => {
            tracing::info!(ray_id = ctx.ray_id(), "Cache MISS - {}", key);
            None
        }
        Err(Error::Serialization(err)) => {
            tracing::warn!(ray_id = ctx.ray_id(), "Discarding corrupt cache entry {}: {}", key, err);
            // Best effort: an entry rewritten by a concurrent request after the read is deleted too.
            if let Err(err) = store.delete(key).await {
                tracing::warn!(ray_id = ctx.ray_id(), "Error cache DELETE: {}", err);
            }
            None
        }
        Err(err) => {
            tracing::warn!(ray_id = ctx.ray_id(), "Error loading {} from cache: {}", key, err);
            None
        }
    }
}
