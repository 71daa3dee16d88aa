//! The transport seam: a fetch-shaped HTTP call.
//!
//! The pipeline only needs something that takes a request descriptor and
//! returns a status plus body bytes. The default implementation wraps a
//! pooled [`reqwest::Client`]; tests inject their own [`Transport`] to
//! observe or fake the wire without a server.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::TransportError;

/// Everything the transport needs to issue one HTTP call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Fully resolved URL.
    pub endpoint: String,
    /// HTTP method, `POST` unless overridden.
    pub method: String,
    /// Merged headers, keys lowercased.
    pub headers: HashMap<String, String>,
    /// Serialized JSON body.
    pub body: Vec<u8>,
}

/// Raw HTTP response handed back to the envelope parser.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// Collaborator interface for the network step.
///
/// Mirroring fetch semantics, an HTTP error status is NOT a transport
/// failure: the body is still returned so the envelope parser can decide.
/// Transport failures are connect/send-level problems only.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues the request and returns the raw response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::message(format!("invalid HTTP method `{}`", request.method)))?;

        let mut builder = self.http.request(method, &request.endpoint);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
