//! JSON-RPC 2.0 envelopes as spoken by the Zabbix API.
//!
//! Requests wrap caller-supplied params untouched. Responses are decoded
//! leniently: any JSON object is accepted and every optional field is looked
//! up explicitly, so an odd error payload never turns into a panic.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request id. The API is used strictly request/response, so it is fixed.
pub const REQUEST_ID: u64 = 1;

/// Content type expected by the API endpoint.
pub const CONTENT_TYPE: &str = "application/json-rpc";

/// Value of `error.data` the server uses to reject a session token.
pub const AUTH_FAILURE_SENTINEL: &str = "Not authorised";

/// A request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub params: Value,
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    pub id: u64,
}

impl Request {
    /// Create an unauthenticated request.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            params,
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            auth: None,
            id: REQUEST_ID,
        }
    }

    /// Attach a session token, if there is one.
    pub fn with_auth(mut self, token: Option<&str>) -> Self {
        self.auth = token.map(str::to_string);
        self
    }

    /// Build the JSON value sent on the wire.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("params".to_string(), self.params.clone());
        object.insert("jsonrpc".to_string(), Value::from(self.jsonrpc.as_str()));
        object.insert("method".to_string(), Value::from(self.method.as_str()));
        if let Some(auth) = &self.auth {
            object.insert("auth".to_string(), Value::from(auth.as_str()));
        }
        object.insert("id".to_string(), Value::from(self.id));
        Value::Object(object)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Encode a request body for `method` carrying `params` and, when present,
/// the session `token`.
pub fn encode(params: &Value, method: &str, token: Option<&str>) -> String {
    Request::new(method, params.clone()).with_auth(token).to_string()
}

/// A decoded response envelope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    /// `result`, absent when missing or `null`.
    pub result: Option<Value>,
    /// `error`, absent when missing or `null`.
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

impl Response {
    fn from_object(mut object: Map<String, Value>) -> Self {
        let result = object.remove("result").filter(|v| !v.is_null());
        let error = object
            .remove("error")
            .filter(|v| !v.is_null())
            .map(RpcError::from_value);
        let id = object.remove("id");
        Self { result, error, id }
    }

    /// Whether the server rejected the session token of the request.
    pub fn is_auth_failure(&self) -> bool {
        self.error.as_ref().is_some_and(RpcError::is_auth_failure)
    }

    /// `result` as a string, for calls that return one (login, version).
    pub fn result_str(&self) -> Option<&str> {
        self.result.as_ref().and_then(Value::as_str)
    }

    /// Split into the result or the server-reported error.
    pub fn into_result(self) -> Result<Option<Value>, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// Server-reported error object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RpcError {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl RpcError {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(object) => Self {
                code: object.get("code").and_then(Value::as_i64),
                message: object.get("message").map(text_of),
                data: object.get("data").filter(|v| !v.is_null()).cloned(),
            },
            // Not the documented shape; keep whatever was sent as the message.
            other => Self {
                message: Some(text_of(&other)),
                ..Self::default()
            },
        }
    }

    /// `data` as a string, when it is one.
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }

    /// True iff `data` is exactly the auth failure sentinel.
    pub fn is_auth_failure(&self) -> bool {
        self.data_str() == Some(AUTH_FAILURE_SENTINEL)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match &self.data {
            Some(data) => write!(f, "{} {}", message, text_of(data)),
            None => f.write_str(message),
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode a response body.
///
/// Accepts a JSON object, or an array holding exactly one object.
pub fn decode(text: &str) -> Result<Response, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    let value: Value = serde_json::from_str(text)?;
    let object = match value {
        Value::Object(object) => object,
        Value::Array(mut items) if items.len() == 1 => match items.pop() {
            Some(Value::Object(object)) => object,
            _ => return Err(DecodeError::NotAnObject("array of non-objects")),
        },
        Value::Array(_) => return Err(DecodeError::NotAnObject("array")),
        Value::Null => return Err(DecodeError::NotAnObject("null")),
        Value::Bool(_) => return Err(DecodeError::NotAnObject("boolean")),
        Value::Number(_) => return Err(DecodeError::NotAnObject("number")),
        Value::String(_) => return Err(DecodeError::NotAnObject("string")),
    };
    Ok(Response::from_object(object))
}

/// Error decoding a response body.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty response body")]
    Empty,
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("response has no {0} field")]
    MissingField(&'static str),
}
