// HTTP client wrapper
// Attaches the session's bearer token to every call, handles 401 globally and
// hands every other failure back to the caller untouched.

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::navigation::{Navigator, Route};
use crate::session::SessionContext;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    // Relative to the API prefix, e.g. "/cart/42"
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Anything that can move a request to the backend and bring a response back.
// Only a missing response is an error here; every status code is a response.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.config.endpoint(&request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self
            .client
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

/// Decoded success body: the payload plus the backend's message, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: Option<String>,
    pub data: T,
}

pub struct HttpClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Ok(self.send(Method::Get, path, None).await?.data)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        Ok(self.send(Method::Post, path, Some(body)).await?.data)
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Ok(self.send(Method::Post, path, None).await?.data)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        Ok(self.send(Method::Put, path, Some(body)).await?.data)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Ok(self.send(Method::Delete, path, None).await?.data)
    }

    // Issues exactly one request and decodes the body as T, keeping the envelope message.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope<T>, ApiError> {
        let bearer = self.session.token();
        let authenticated = bearer.is_some();
        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
            bearer,
        };

        let started = Instant::now();
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "request failed without response");
                return Err(e);
            }
        };
        tracing::debug!(
            %method,
            path,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        if response.status == 401 && authenticated {
            if self.session.invalidate() {
                tracing::warn!(%method, path, "authorization rejected, redirecting to login");
                self.navigator.navigate(Route::Login);
            }
            return Err(ApiError::Unauthorized);
        }

        if !response.is_success() {
            return Err(error_from_response(&response));
        }

        decode_envelope(response.status, &response.body)
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("request body: {}", e)))
}

fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn is_envelope(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => map.contains_key("data") && (map.contains_key("message") || map.contains_key("status")),
        None => false,
    }
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> Result<Envelope<T>, ApiError> {
    let value = parse_body(body)?;
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    if is_envelope(&value) {
        let inner = value.get("data").cloned().unwrap_or(Value::Null);
        if let Ok(data) = serde_json::from_value::<T>(inner) {
            return Ok(Envelope {
                status,
                message,
                data,
            });
        }
    }

    let data = serde_json::from_value::<T>(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(Envelope {
        status,
        message,
        data,
    })
}

pub(crate) fn error_from_response(response: &ApiResponse) -> ApiError {
    let value = parse_body(&response.body).unwrap_or(Value::Null);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("data")
                .and_then(|data| data.get("message"))
                .and_then(Value::as_str)
        })
        .or_else(|| value.get("error").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("Request failed")
                .to_string()
        });

    ApiError::Api {
        status: response.status,
        message,
    }
}
