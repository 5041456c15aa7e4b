use std::{future::IntoFuture, time::Duration};

use futures_util::future::{FutureExt, LocalBoxFuture};
use response_cache::{Gateway, Request, ResponseCacheConfig, ResponseCacheSettings};
use runtime::kv::KvStore;
use runtime_local::{BackgroundTasks, InMemoryKvStore, LocalRequestContext, ManualClock};
use serde_json::Value;

use crate::MockExecutor;

/// Header the default session hook reads the session id from.
pub const SESSION_ID_HEADER: &str = "session-id";

pub struct TestGatewayBuilder {
    executor: MockExecutor,
    config: ResponseCacheConfig,
    clock: ManualClock,
    store: KvStore,
    configured_store: bool,
}

impl TestGatewayBuilder {
    #[must_use]
    pub fn with_settings(mut self, settings: ResponseCacheSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Reads the session id from the `session-id` request header.
    #[must_use]
    pub fn with_session_header(self) -> Self {
        self.with_config(|config| {
            config.with_session_id(|operation| {
                let session_id = operation.header(SESSION_ID_HEADER).map(str::to_string);
                async move { Ok(session_id) }
            })
        })
    }

    /// Gives the store to the response cache configuration instead of providing it to every
    /// operation.
    #[must_use]
    pub fn with_configured_store(mut self) -> Self {
        self.configured_store = true;
        self
    }

    #[must_use]
    pub fn with_config(mut self, f: impl FnOnce(ResponseCacheConfig) -> ResponseCacheConfig) -> Self {
        self.config = f(self.config);
        self
    }

    pub fn build(self) -> TestGateway {
        let mut config = self.config.with_clock(self.clock.clone());
        let mut gateway_store = Some(self.store.clone());
        if self.configured_store {
            config = config.with_cache(self.store.clone());
            gateway_store = None;
        }

        let mut gateway = Gateway::new(self.executor, config);
        if let Some(store) = gateway_store {
            gateway = gateway.with_default_cache(store);
        }

        TestGateway {
            gateway,
            clock: self.clock,
            store: self.store,
            background: BackgroundTasks::new(),
        }
    }
}

/// A gateway running on a simulated clock, with an in-memory store sharing that clock.
pub struct TestGateway {
    gateway: Gateway<MockExecutor>,
    clock: ManualClock,
    store: KvStore,
    background: BackgroundTasks,
}

impl TestGateway {
    pub fn builder(executor: MockExecutor) -> TestGatewayBuilder {
        let clock = ManualClock::new();
        TestGatewayBuilder {
            executor,
            config: ResponseCacheConfig::default(),
            store: KvStore::new(InMemoryKvStore::with_clock(clock.clone())),
            clock,
            configured_store: false,
        }
    }

    pub fn post(&self, query: impl Into<String>) -> TestRequest<'_> {
        TestRequest {
            gateway: self,
            request: Request::new(query),
            headers: http::HeaderMap::new(),
        }
    }

    pub fn advance_clock(&self, duration: Duration) {
        self.clock.advance(duration);
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn executor(&self) -> &MockExecutor {
        self.gateway.executor()
    }
}

#[must_use]
pub struct TestRequest<'a> {
    gateway: &'a TestGateway,
    request: Request,
    headers: http::HeaderMap,
}

impl TestRequest<'_> {
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(name, value.parse().unwrap());
        self
    }

    pub fn session(self, session_id: &str) -> Self {
        self.header(SESSION_ID_HEADER, session_id)
    }

    pub fn operation_name(mut self, name: &str) -> Self {
        self.request.operation_name = Some(name.to_string());
        self
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.request.variables = serde_json::from_value(variables).unwrap();
        self
    }
}

impl<'a> IntoFuture for TestRequest<'a> {
    type Output = TestResponse;
    type IntoFuture = LocalBoxFuture<'a, TestResponse>;

    /// Sends the request and waits for the cache writes it triggered.
    fn into_future(self) -> Self::IntoFuture {
        async move {
            let TestRequest {
                gateway,
                request,
                headers,
            } = self;

            let ctx = LocalRequestContext::new(next_ray_id(), gateway.background.clone()).with_headers(headers);
            let response = gateway.gateway.execute(&ctx, request).await.map_err(|err| err.to_string());
            gateway.background.wait().await;

            match response {
                Ok(response) => TestResponse {
                    body: response.to_json(),
                    headers: response.headers,
                    error: None,
                },
                Err(error) => TestResponse {
                    body: Value::Null,
                    headers: http::HeaderMap::new(),
                    error: Some(error),
                },
            }
        }
        .boxed_local()
    }
}

fn next_ray_id() -> String {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    format!("ray-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug)]
pub struct TestResponse {
    pub body: Value,
    pub headers: http::HeaderMap,
    /// Set when the gateway failed the request instead of producing a response.
    pub error: Option<String>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|value| value.to_str().unwrap())
    }

    pub fn cache_control(&self) -> Option<&str> {
        self.header("cache-control")
    }

    pub fn age(&self) -> Option<&str> {
        self.header("age")
    }
}

impl serde::Serialize for TestResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}
