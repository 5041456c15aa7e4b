use async_graphql_parser::{
    types::{DocumentOperations, ExecutableDocument, OperationDefinition},
    Positioned,
};
use runtime::kv::KvStore;
use serde_json::{Map, Value};

use crate::{BaseCacheKeyData, CachePolicy, GraphqlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl From<async_graphql_parser::types::OperationType> for OperationType {
    fn from(value: async_graphql_parser::types::OperationType) -> Self {
        use async_graphql_parser::types::OperationType as Parsed;
        match value {
            Parsed::Query => OperationType::Query,
            Parsed::Mutation => OperationType::Mutation,
            Parsed::Subscription => OperationType::Subscription,
        }
    }
}

/// A GraphQL request as received from the client.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Response cache bookkeeping carried from the read to the write of a request.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResponseCacheState {
    /// Set once the hooks ran, absent when the request does not take part in caching.
    pub base_key: Option<BaseCacheKeyData>,
    pub session_id: Option<String>,
    /// Epoch milliseconds of the cached response that was served.
    pub cache_time: Option<u64>,
}

/// Everything known about the operation being processed.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub request: Request,
    pub operation_type: OperationType,
    pub operation: Positioned<OperationDefinition>,
    /// The whole document, needed for fragment definitions.
    pub document: ExecutableDocument,
    pub headers: http::HeaderMap,
    pub overall_cache_policy: CachePolicy,
    pub response_cache_hit: bool,
    /// Store provided by the server, used when the response cache has none configured.
    pub cache: Option<KvStore>,
    pub(crate) cache_state: ResponseCacheState,
}

impl OperationContext {
    /// Parses the request and selects the operation to execute.
    pub fn parse(request: Request, headers: http::HeaderMap) -> Result<Self, GraphqlError> {
        let document =
            async_graphql_parser::parse_query(&request.query).map_err(|err| GraphqlError::new(err.to_string()))?;

        let operation = match (&document.operations, request.operation_name.as_deref()) {
            (DocumentOperations::Single(operation), None) => operation.clone(),
            (DocumentOperations::Single(_), Some(name)) => {
                return Err(GraphqlError::new(format!("Unknown operation named \"{name}\"")))
            }
            (DocumentOperations::Multiple(operations), Some(name)) => operations
                .get(name)
                .cloned()
                .ok_or_else(|| GraphqlError::new(format!("Unknown operation named \"{name}\"")))?,
            (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => operations
                .values()
                .next()
                .cloned()
                .ok_or_else(|| GraphqlError::new("Missing operation"))?,
            (DocumentOperations::Multiple(_), None) => {
                return Err(GraphqlError::new(
                    "Operation name is required when the document contains several operations",
                ))
            }
        };

        Ok(OperationContext {
            operation_type: operation.node.ty.into(),
            operation,
            document,
            request,
            headers,
            overall_cache_policy: CachePolicy::new(),
            response_cache_hit: false,
            cache: None,
            cache_state: ResponseCacheState::default(),
        })
    }

    /// Value of a request header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.cache_state.session_id.as_deref()
    }
}
