//! reqwest-backed HTTP wrapper

use crate::session;
use marketplace_core::environment::{ApiClient, ApiFuture, SessionStorage};
use marketplace_core::http::{ApiError, ApiRequest, FormPart, Method, RequestBody};
use marketplace_runtime::metrics::ApiMetrics;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The production [`ApiClient`]
///
/// Joins request paths onto the base URL, attaches the bearer token from the
/// session for authenticated requests, and parses the JSON body. An empty
/// body parses to `Null`; a non-2xx response becomes [`ApiError::Status`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStorage>,
}

impl HttpClient {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the underlying client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<dyn SessionStorage>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder, ApiError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if request.authenticated {
            match session::access_token(self.session.as_ref()) {
                Some(token) => builder = builder.bearer_auth(token),
                None => tracing::debug!(path = %request.path, "No access token in session"),
            }
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        Ok(builder)
    }

    #[tracing::instrument(
        name = "api_request",
        skip(self, request),
        fields(method = %request.method, path = %request.path)
    )]
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let method = request.method.as_str();
        let started = Instant::now();

        let response = match self.build(request)?.send().await {
            Ok(response) => response,
            Err(e) => {
                ApiMetrics::record_request(method, "network".to_string(), started.elapsed());
                tracing::warn!(error = %e, "Request failed before a response");
                return Err(ApiError::Network(e.to_string()));
            },
        };

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        ApiMetrics::record_request(method, status.as_u16().to_string(), started.elapsed());

        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Request succeeded");
            parse_body(&bytes)
        } else {
            let body = parse_body(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            });
            tracing::info!(status = status.as_u16(), "Request rejected by server");
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient for HttpClient {
    fn execute(&self, request: ApiRequest) -> ApiFuture<'_> {
        Box::pin(self.send(request))
    }
}

const fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn multipart_form(parts: Vec<FormPart>) -> Result<Form, ApiError> {
    parts.into_iter().try_fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => Ok(form.text(name, value)),
        FormPart::File {
            name,
            file_name,
            mime,
            bytes,
        } => {
            let file = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(&mime)
                .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
            Ok(form.part(name, file))
        },
    })
}

fn parse_body(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
