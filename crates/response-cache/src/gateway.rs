use runtime::{context::RequestContext, kv::KvStore};
use tracing::Instrument;

use crate::{
    write_cache_control_header, Error, HintCollector, OperationContext, Request, Response, ResponseCacheConfig,
    ResponseCachePlugin,
};

/// Executes a resolved operation. Every field resolution is expected to go through
/// [`HintCollector::will_resolve_field`] so the cache policy of the response can be computed.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, operation: &OperationContext, hints: &HintCollector) -> Result<Response, Error>;
}

/// Request pipeline wrapping an [`Executor`] with the response cache.
pub struct Gateway<E> {
    executor: E,
    plugin: ResponseCachePlugin,
    default_cache: Option<KvStore>,
}

impl<E: Executor> Gateway<E> {
    pub fn new(executor: E, config: ResponseCacheConfig) -> Self {
        Gateway {
            executor,
            plugin: ResponseCachePlugin::new(config),
            default_cache: None,
        }
    }

    /// Store provided by the server to every operation, used when the response cache
    /// configuration has none.
    #[must_use]
    pub fn with_default_cache(mut self, cache: KvStore) -> Self {
        self.default_cache = Some(cache);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn plugin(&self) -> &ResponseCachePlugin {
        &self.plugin
    }

    pub async fn execute(&self, ctx: &impl RequestContext, request: Request) -> Result<Response, Error> {
        let ray_id = ctx.ray_id();

        let mut operation = match OperationContext::parse(request, ctx.headers().clone()) {
            Ok(operation) => operation,
            Err(error) => {
                tracing::debug!(ray_id, "Invalid operation: {}", error.message);
                return Ok(Response::from_errors(vec![error]));
            }
        };
        operation.cache = self.default_cache.clone();

        let mut response = match self.plugin.response_for_operation(ctx, &mut operation).await? {
            Some(data) => Response::single(data),
            None => {
                let hints = self.plugin.hint_collector();
                let response = self
                    .executor
                    .execute(&operation, &hints)
                    .instrument(tracing::info_span!("execute", ray_id, operation_type = %operation.operation_type))
                    .await?;
                hints.fold_into(&mut operation.overall_cache_policy);
                response
            }
        };

        self.plugin.will_send_response(ctx, &operation, &mut response).await?;

        if self.plugin.settings().calculate_http_headers {
            write_cache_control_header(&operation.overall_cache_policy, &mut response);
        }

        Ok(response)
    }
}
