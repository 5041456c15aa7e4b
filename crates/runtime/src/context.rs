use futures_util::future::BoxFuture;

/// Transport level view of the request being processed.
#[async_trait::async_trait]
pub trait RequestContext: Send + Sync {
    fn ray_id(&self) -> &str;

    /// Hands over work that must outlive the request. Implementations start driving the future
    /// before returning, but the caller does not wait for its completion.
    async fn wait_until(&self, fut: BoxFuture<'static, ()>);

    fn headers(&self) -> &http::HeaderMap;
}
