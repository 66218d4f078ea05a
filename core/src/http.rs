//! HTTP vocabulary shared by the API client and the slice reducers
//!
//! Requests are plain values built by reducers and executed by an
//! [`ApiClient`](crate::environment::ApiClient). Responses are normalized
//! through one envelope contract and failures through one [`Failure`] shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// HTTP method used by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field
    Text {
        /// Field name
        name: String,
        /// Field value
        value: String,
    },
    /// Uploaded file
    File {
        /// Field name
        name: String,
        /// File name sent to the server
        file_name: String,
        /// MIME type, e.g. `image/png`
        mime: String,
        /// File contents
        bytes: Vec<u8>,
    },
}

impl FormPart {
    /// Build a text part
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Field name of this part
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request body
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON document
    Json(Value),
    /// Multipart form (image uploads)
    Multipart(Vec<FormPart>),
}

/// A single request against the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/buyer/cart`
    pub path: String,
    /// Query string parameters, in order
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
    /// Whether the bearer token must be attached
    pub authenticated: bool,
}

impl ApiRequest {
    /// Create an authenticated request with no body
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authenticated: true,
        }
    }

    /// GET request
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST request
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// PUT request
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// DELETE request
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Send without the bearer token (sign-in, sign-up, password reset)
    #[must_use]
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Attach a multipart body
    #[must_use]
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Errors produced by the HTTP wrapper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("Server responded with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Parsed response body (`Null` when empty or not JSON)
        body: Value,
    },

    /// The response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Successful response payload plus the optional server message
///
/// Every response goes through [`Envelope::from_body`]: a JSON object with a
/// `data` key is unwrapped to that key, any other body is the payload itself.
/// A string `message` at the top level of an object is always kept as the
/// envelope message and never becomes part of the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    /// The payload
    pub data: T,
    /// Human-readable outcome provided by the server
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Wrap a payload without a message
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Attach a message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Transform the payload, keeping the message
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            data: f(self.data),
            message: self.message,
        }
    }
}

impl Envelope<Value> {
    /// Normalize a raw response body
    #[must_use]
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) => {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                match map.remove("data") {
                    Some(data) => Self { data, message },
                    None => {
                        if message.is_some() {
                            map.remove("message");
                        }
                        Self {
                            data: Value::Object(map),
                            message,
                        }
                    },
                }
            },
            other => Self::new(other),
        }
    }

    /// Decode the payload into a typed value
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Envelope<T>, ApiError> {
        let data = serde_json::from_value(self.data).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Envelope {
            data,
            message: self.message,
        })
    }
}

/// Normalized rejected value surfaced to the user
///
/// Network errors, validation errors and business-rule rejections all collapse
/// into this one shape; only the message differs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct Failure {
    /// Human-readable message
    pub message: String,
}

impl Failure {
    /// Message used when the server gives none
    pub const GENERIC_MESSAGE: &'static str = "Something went wrong. Please try again.";

    /// Create a failure with a specific message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Failure with the generic message
    #[must_use]
    pub fn generic() -> Self {
        Self::new(Self::GENERIC_MESSAGE)
    }
}

impl From<&ApiError> for Failure {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::Status { body, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.trim().is_empty())
                .map_or_else(Self::generic, Self::new),
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => {
                Self::generic()
            },
        }
    }
}

impl From<ApiError> for Failure {
    fn from(error: ApiError) -> Self {
        Self::from(&error)
    }
}

/// Decode a raw API result into a typed envelope or a normalized failure
///
/// # Errors
///
/// Returns a [`Failure`] when the request failed or the payload does not decode.
pub fn decode_response<T: DeserializeOwned>(
    result: Result<Value, ApiError>,
) -> Result<Envelope<T>, Failure> {
    result
        .and_then(|body| Envelope::from_body(body).decode())
        .map_err(Failure::from)
}
