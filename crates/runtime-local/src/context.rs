use futures_util::future::BoxFuture;
use runtime::context::RequestContext;
use tokio_util::task::TaskTracker;

/// Tracks work spawned through [`RequestContext::wait_until`] so it can be awaited, typically by
/// tests or during a graceful shutdown.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the future on the current tokio runtime.
    pub fn spawn(&self, fut: BoxFuture<'static, ()>) {
        self.tracker.spawn(fut);
    }

    /// Waits until every task spawned so far has completed. New tasks can still be spawned
    /// afterwards.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }
}

pub struct LocalRequestContext {
    ray_id: String,
    headers: http::HeaderMap,
    background: BackgroundTasks,
}

impl LocalRequestContext {
    pub fn new(ray_id: impl Into<String>, background: BackgroundTasks) -> Self {
        LocalRequestContext {
            ray_id: ray_id.into(),
            headers: http::HeaderMap::new(),
            background,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

#[async_trait::async_trait]
impl RequestContext for LocalRequestContext {
    fn ray_id(&self) -> &str {
        &self.ray_id
    }

    async fn wait_until(&self, fut: BoxFuture<'static, ()>) {
        tracing::trace!(ray_id = self.ray_id.as_str(), "spawning background task");
        self.background.spawn(fut);
    }

    fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }
}
