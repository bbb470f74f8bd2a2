//! The request pipeline: descriptor in, decoded envelope or classified
//! failure out.
//!
//! Each call is an independent suspend-capable sequence with no shared
//! mutable state: the configuration is immutable and `reqwest::Client` is
//! internally shareable, so calls may run concurrently without coordination.
//! There is no retry logic here; retries belong to a wrapping collaborator.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;

use crate::config::{HttpApiConfig, TransportMode};
use crate::error::HttpApiError;
use crate::hooks::{NoopHooks, RequestHooks};
use crate::options::QueryOptions;
use crate::response::ResponseEnvelope;
use crate::url::append_query;

/// Reserved request header carrying JSON-serialized query options when
/// header delivery is selected. The header is authoritative server-side;
/// query-string parameters are ignored while it is present.
pub const OPTIONS_HEADER: &str = "x-query-options";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request payload. JSON bodies are serialized and tagged
/// `application/json`; opaque byte payloads pass through unmodified with the
/// content type left to the transport default.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Bytes(Vec<u8>),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// One logical request, constructed per call and consumed once.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub verb: Verb,
    pub url: String,
    pub body: Option<RequestBody>,
    pub options: Option<QueryOptions>,
    /// Per-call transport-mode flag; wins over the config-level override.
    pub transport_mode: Option<TransportMode>,
}

impl RequestDescriptor {
    pub fn new(verb: Verb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            body: None,
            options: None,
            transport_mode: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_transport_mode(mut self, mode: TransportMode) -> Self {
        self.transport_mode = Some(mode);
        self
    }
}

/// Async request pipeline over a shared transport client.
#[derive(Debug)]
pub struct HttpClient<H: RequestHooks = NoopHooks> {
    http: Client,
    config: HttpApiConfig,
    hooks: H,
}

impl HttpClient<NoopHooks> {
    pub fn new(config: HttpApiConfig) -> Result<Self, HttpApiError> {
        Self::with_hooks(config, NoopHooks)
    }
}

impl<H: RequestHooks> HttpClient<H> {
    pub fn with_hooks(config: HttpApiConfig, hooks: H) -> Result<Self, HttpApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(HttpApiError::from)?;
        Ok(Self { http, config, hooks })
    }

    pub fn config(&self) -> &HttpApiConfig {
        &self.config
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Assemble the transport request without sending it: resolve the
    /// transport mode, attach the options as query string or header, await
    /// the hook-provided base headers and encode the body.
    pub async fn build_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<reqwest::RequestBuilder, HttpApiError> {
        let mode = resolve_transport_mode(request.transport_mode, self.config.transport_mode);

        let mut url = request.url.clone();
        let mut options_header = None;
        if let Some(options) = &request.options {
            match mode {
                TransportMode::QueryString => {
                    url = append_query(&url, &options.to_query_string()?);
                }
                TransportMode::Header => {
                    options_header = Some(serde_json::to_string(options)?);
                }
            }
        }

        let mut headers = HeaderMap::new();
        for (key, value) in &self.config.extra_headers {
            insert_header(&mut headers, key, value)?;
        }
        for (key, value) in self.hooks.provide_headers(&url, request.verb).await {
            insert_header(&mut headers, &key, &value)?;
        }
        if let Some(serialized) = options_header {
            insert_header(&mut headers, OPTIONS_HEADER, &serialized)?;
        }

        let mut builder = self
            .http
            .request(request.verb.as_method(), url.as_str())
            .headers(headers);
        match &request.body {
            Some(RequestBody::Json(value)) => builder = builder.json(value),
            Some(RequestBody::Bytes(bytes)) => builder = builder.body(bytes.clone()),
            None => {}
        }
        Ok(builder)
    }

    /// Execute one logical request. Failures of either kind pass through
    /// `on_request_failure` before being re-raised.
    pub async fn dispatch(
        &self,
        request: RequestDescriptor,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        match self.run(&request).await {
            Ok(envelope) => Ok(envelope),
            Err(error) => {
                self.hooks.on_request_failure(&error).await;
                Err(error)
            }
        }
    }

    async fn run(&self, request: &RequestDescriptor) -> Result<ResponseEnvelope, HttpApiError> {
        let response = self
            .build_request(request)
            .await?
            .send()
            .await
            .map_err(HttpApiError::Transport)?;
        let envelope = ResponseEnvelope::read(response).await?;
        check_status(envelope)
    }

    pub async fn get(
        &self,
        url: &str,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.dispatch(descriptor(Verb::Get, url, None, options)).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.dispatch(descriptor(Verb::Post, url, Some(body.into()), options))
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.dispatch(descriptor(Verb::Put, url, Some(body.into()), options))
            .await
    }

    pub async fn patch(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.dispatch(descriptor(Verb::Patch, url, Some(body.into()), options))
            .await
    }

    pub async fn delete(
        &self,
        url: &str,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.dispatch(descriptor(Verb::Delete, url, None, options)).await
    }
}

fn descriptor(
    verb: Verb,
    url: &str,
    body: Option<RequestBody>,
    options: Option<QueryOptions>,
) -> RequestDescriptor {
    RequestDescriptor {
        verb,
        url: url.to_owned(),
        body,
        options,
        transport_mode: None,
    }
}

/// Precedence: explicit per-call flag, then the config-level override, then
/// query-string delivery.
pub fn resolve_transport_mode(
    per_call: Option<TransportMode>,
    configured: Option<TransportMode>,
) -> TransportMode {
    per_call
        .or(configured)
        .unwrap_or(TransportMode::QueryString)
}

/// Status >= 400 turns a decoded envelope into a failure.
fn check_status(envelope: ResponseEnvelope) -> Result<ResponseEnvelope, HttpApiError> {
    if envelope.status >= 400 {
        return Err(HttpApiError::Status(envelope));
    }
    Ok(envelope)
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) -> Result<(), HttpApiError> {
    let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|_| HttpApiError::InvalidHeader(format!("invalid header name: {key}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| HttpApiError::InvalidHeader(format!("invalid header value for {key}")))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::response::ResponseData;

    use super::*;

    #[test]
    fn transport_mode_per_call_flag_wins() {
        assert_eq!(
            resolve_transport_mode(Some(TransportMode::Header), Some(TransportMode::QueryString)),
            TransportMode::Header
        );
        assert_eq!(
            resolve_transport_mode(Some(TransportMode::QueryString), Some(TransportMode::Header)),
            TransportMode::QueryString
        );
    }

    #[test]
    fn transport_mode_falls_back_to_configured_override() {
        assert_eq!(
            resolve_transport_mode(None, Some(TransportMode::Header)),
            TransportMode::Header
        );
        assert_eq!(
            resolve_transport_mode(None, Some(TransportMode::QueryString)),
            TransportMode::QueryString
        );
    }

    #[test]
    fn transport_mode_defaults_to_query_string() {
        assert_eq!(resolve_transport_mode(None, None), TransportMode::QueryString);
    }

    #[test]
    fn status_400_is_the_failure_threshold() {
        let envelope = |status| ResponseEnvelope {
            status,
            headers: BTreeMap::new(),
            data: ResponseData::Empty,
        };
        assert!(check_status(envelope(399)).is_ok());
        let error = check_status(envelope(400)).unwrap_err();
        assert_eq!(error.status(), Some(400));
    }
}
