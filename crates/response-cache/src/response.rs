use serde_json::Value;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            path: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<Value>) -> Self {
        self.path = path;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SingleResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Single(SingleResult),
    /// Deferred or streamed results. Never cached.
    Incremental(Vec<SingleResult>),
}

/// The response sent back to the client, along with the HTTP headers set while producing it.
#[derive(Debug, Clone)]
pub struct Response {
    pub body: ResponseBody,
    pub headers: http::HeaderMap,
}

impl Response {
    pub fn single(data: Value) -> Self {
        Self::from_result(SingleResult {
            data: Some(data),
            errors: Vec::new(),
        })
    }

    pub fn from_errors(errors: Vec<GraphqlError>) -> Self {
        Self::from_result(SingleResult { data: None, errors })
    }

    pub fn from_result(result: SingleResult) -> Self {
        Response {
            body: ResponseBody::Single(result),
            headers: http::HeaderMap::new(),
        }
    }

    pub fn incremental(results: Vec<SingleResult>) -> Self {
        Response {
            body: ResponseBody::Incremental(results),
            headers: http::HeaderMap::new(),
        }
    }

    /// Data of a single response.
    pub fn data(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Single(result) => result.data.as_ref(),
            ResponseBody::Incremental(_) => None,
        }
    }

    pub fn errors(&self) -> &[GraphqlError] {
        match &self.body {
            ResponseBody::Single(result) => &result.errors,
            ResponseBody::Incremental(_) => &[],
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self.body, ResponseBody::Single(_))
    }

    /// The JSON body of a single response, as it would be sent over the wire.
    pub fn to_json(&self) -> Value {
        match &self.body {
            ResponseBody::Single(result) => serde_json::to_value(result).unwrap_or_default(),
            ResponseBody::Incremental(results) => serde_json::to_value(results).unwrap_or_default(),
        }
    }
}
