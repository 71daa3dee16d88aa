//! Request executor: config merge, the wire body, the deadline, and the
//! envelope split into data versus GraphQL errors.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::{ClientConfig, FetchConfig, GqlOptions};
use crate::error::{GqlError, GraphQLError};
use crate::operation::Operation;
use crate::transport::{Transport, TransportRequest};

const CONTENT_TYPE: &str = "content-type";
const DEFAULT_METHOD: &str = "POST";

/// Response envelope per the GraphQL-over-HTTP convention.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

/// Field-by-field header merge: call-level beats client-default, and
/// `content-type: application/json` is supplied unless some layer overrides
/// it. Keys are lowercased so the override works regardless of spelling.
pub(crate) fn merge_headers(base: &FetchConfig, call: &FetchConfig) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(CONTENT_TYPE.to_owned(), "application/json".to_owned());
    for (name, value) in base.headers.iter().chain(call.headers.iter()) {
        headers.insert(name.to_lowercase(), value.clone());
    }
    headers
}

/// Method precedence: per-call override, then call fetch config, then client
/// default, then `POST`.
pub(crate) fn resolve_method(config: &ClientConfig, options: &GqlOptions) -> String {
    options
        .method
        .clone()
        .or_else(|| options.config.method.clone())
        .or_else(|| config.fetch.method.clone())
        .unwrap_or_else(|| DEFAULT_METHOD.to_owned())
}

/// Assembles the wire request from the layered configuration.
pub(crate) fn build_request(
    config: &ClientConfig,
    options: &GqlOptions,
    operation: &Operation,
) -> Result<TransportRequest, GqlError> {
    let endpoint = options
        .endpoint
        .clone()
        .unwrap_or_else(|| config.endpoint.clone());

    let body = json!({
        "query": operation.query,
        "variables": operation.variables,
        "operationName": operation.operation_name,
    });
    let body = serde_json::to_vec(&body).map_err(|err| GqlError::Json {
        message: err.to_string(),
    })?;

    Ok(TransportRequest {
        endpoint,
        method: resolve_method(config, options),
        headers: merge_headers(&config.fetch, &options.config),
        body,
    })
}

/// Performs the network step under the configured deadline.
///
/// A positive timeout wraps the transport future; expiry drops it, which
/// aborts the in-flight HTTP call, and surfaces [`GqlError::Timeout`]. A
/// zero timeout disables the deadline.
pub(crate) async fn execute(
    transport: &dyn Transport,
    config: &ClientConfig,
    options: &GqlOptions,
    operation: &Operation,
) -> Result<Value, GqlError> {
    let request = build_request(config, options, operation)?;
    debug!(
        endpoint = %request.endpoint,
        operation = %operation.operation_name,
        "issuing GraphQL request"
    );

    let send = transport.send(request);
    let response = if config.timeout > Duration::ZERO {
        match tokio::time::timeout(config.timeout, send).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GqlError::Timeout {
                    elapsed: config.timeout,
                })
            }
        }
    } else {
        send.await?
    };

    let envelope: ResponseEnvelope = serde_json::from_slice(&response.body).map_err(|err| {
        GqlError::Json {
            message: format!("status {}: {err}", response.status),
        }
    })?;

    if !envelope.errors.is_empty() {
        warn!(
            operation = %operation.operation_name,
            count = envelope.errors.len(),
            "response envelope carried GraphQL errors"
        );
        return Err(GqlError::Graphql(envelope.errors));
    }

    envelope.data.ok_or_else(|| {
        warn!(
            operation = %operation.operation_name,
            "response envelope carried neither data nor errors"
        );
        GqlError::Protocol {
            message: "response envelope carried neither data nor errors".to_owned(),
        }
    })
}
