//! HTTP transport.
//!
//! [`HttpTransport`] is the seam to the network: one request in, one status
//! and body out. [`Transport`] sits on top of it, routing authenticated POSTs
//! through the request signer and turning non-2xx statuses into errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::signing::{Action, OperationKind, PayloadValue, RequestSigner};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request relative to the venue base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one HTTP request. No retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport with explicit request and connect timeouts.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = match request.method {
            Method::Get => self.http_client.get(&url).query(&request.query),
            Method::Post => {
                let builder = self.http_client.post(&url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// How a POST body is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Sent verbatim.
    None,
    /// Signed under the given kind and wrapped in an envelope.
    Signed(OperationKind),
}

/// GET/POST over an [`HttpTransport`], with signing for authenticated POSTs.
#[derive(Clone)]
pub struct Transport {
    http: Arc<dyn HttpTransport>,
    signer: RequestSigner,
}

impl Transport {
    pub fn new(http: Arc<dyn HttpTransport>, signer: RequestSigner) -> Self {
        Self { http, signer }
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// GET with query parameters. Empty values are left out of the query.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();

        self.send(HttpRequest {
            method: Method::Get,
            path: path.to_string(),
            query,
            body: None,
        })
        .await
    }

    /// POST a JSON body, signing it first when `auth` asks for it.
    pub async fn post<B, T>(&self, path: &str, body: &B, auth: Auth) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = match auth {
            Auth::None => serde_json::to_value(body)?,
            Auth::Signed(kind) => {
                let payload = PayloadValue::object_from(body)?;
                let envelope = self.signer.sign(kind, payload).await?;
                serde_json::to_value(&envelope)?
            }
        };

        self.send(HttpRequest {
            method: Method::Post,
            path: path.to_string(),
            query: Vec::new(),
            body: Some(body),
        })
        .await
    }

    /// Sign and POST a typed action to its endpoint.
    pub async fn post_action<A, T>(&self, action: &A) -> Result<T>
    where
        A: Action + Sync,
        T: DeserializeOwned,
    {
        self.post(A::PATH, action, Auth::Signed(A::KIND)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let method = request.method;
        let path = request.path.clone();
        debug!(method = ?method, path = %path, "Dispatching request");

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            warn!(
                method = ?method,
                path = %path,
                status = response.status,
                "Request rejected"
            );
            return Err(Error::Transport {
                status: response.status,
                body: response.body,
            });
        }

        Ok(serde_json::from_str(&response.body)?)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
